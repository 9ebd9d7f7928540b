pub(super) fn init_metrics() {
    describe_upload();
    describe_process();
}

fn describe_upload() {
    metrics::describe_counter!(
        UPLOAD,
        "How many uploads have finished, labelled by outcome"
    );
    metrics::describe_histogram!(
        UPLOAD_BYTES,
        metrics::Unit::Bytes,
        "Sizes of staged uploads"
    );
    metrics::describe_counter!(
        UPLOAD_ASPECT,
        "How many uploads were classified into each aspect class"
    );
}

pub(crate) const UPLOAD: &str = "vidkeep.upload";
pub(crate) const UPLOAD_BYTES: &str = "vidkeep.upload.bytes";
pub(crate) const UPLOAD_ASPECT: &str = "vidkeep.upload.aspect";

fn describe_process() {
    metrics::describe_counter!(PROCESS_START, "How many external tools have been spawned");
    metrics::describe_histogram!(
        PROCESS_DURATION,
        metrics::Unit::Seconds,
        "Timings for external tools"
    );
    metrics::describe_counter!(
        PROCESS_END,
        "How many external tools have exited, labelled by completion"
    );
}

pub(crate) const PROCESS_START: &str = "vidkeep.process.start";
pub(crate) const PROCESS_DURATION: &str = "vidkeep.process.duration";
pub(crate) const PROCESS_END: &str = "vidkeep.process.end";
