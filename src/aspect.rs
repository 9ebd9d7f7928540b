use crate::error_code::ErrorCode;

/// Coarse layout bucket derived from stream geometry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum AspectClass {
    Landscape,
    Portrait,
    Other,
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid video geometry {width}x{height}")]
pub(crate) struct GeometryError {
    width: u32,
    height: u32,
}

impl GeometryError {
    pub(crate) const fn error_code(&self) -> ErrorCode {
        ErrorCode::INVALID_GEOMETRY
    }
}

// 16/9 - 0.1 == 151/90
const LANDSCAPE_NUM: u64 = 151;
const LANDSCAPE_DEN: u64 = 90;

// 9/16 + 0.1 == 53/80
const PORTRAIT_NUM: u64 = 53;
const PORTRAIT_DEN: u64 = 80;

impl AspectClass {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Landscape => "landscape",
            Self::Portrait => "portrait",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for AspectClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a width/height pair against the 16:9 and 9:16 reference ratios with a 0.1 tolerance
///
/// Ratios are compared by cross-multiplying against the exact rational thresholds, so boundary
/// geometries land in the same bucket on every platform.
pub(crate) fn classify(width: u32, height: u32) -> Result<AspectClass, GeometryError> {
    if width == 0 || height == 0 {
        return Err(GeometryError { width, height });
    }

    let width = u64::from(width);
    let height = u64::from(height);

    if width * LANDSCAPE_DEN >= height * LANDSCAPE_NUM {
        Ok(AspectClass::Landscape)
    } else if width * PORTRAIT_DEN <= height * PORTRAIT_NUM {
        Ok(AspectClass::Portrait)
    } else {
        Ok(AspectClass::Other)
    }
}
