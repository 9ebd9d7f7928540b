use crate::error_code::ErrorCode;

const SEPARATOR: char = ',';

#[derive(Debug, thiserror::Error)]
pub(crate) enum LocatorError {
    #[error("Locator must have the form \"<bucket>,<key>\"")]
    Format,

    #[error("Locator component is empty")]
    Empty,

    #[error("Locator component contains a comma")]
    Separator,
}

impl LocatorError {
    pub(crate) const fn error_code(&self) -> ErrorCode {
        ErrorCode::MALFORMED_LOCATOR
    }
}

/// The persisted pointer to a stored object
///
/// Serialized as `"<bucket>,<key>"`. Neither component may be empty or contain a comma, so
/// every locator this type produces decodes back into the same pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Locator {
    bucket: String,
    key: String,
}

impl Locator {
    pub(crate) fn new(bucket: impl Into<String>, key: impl Into<String>) -> Result<Self, LocatorError> {
        let bucket = bucket.into();
        let key = key.into();

        validate(&bucket)?;
        validate(&key)?;

        Ok(Locator { bucket, key })
    }

    pub(crate) fn bucket(&self) -> &str {
        &self.bucket
    }

    pub(crate) fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn encode(&self) -> String {
        self.to_string()
    }

    pub(crate) fn decode(s: &str) -> Result<Self, LocatorError> {
        let mut parts = s.split(SEPARATOR);

        let (Some(bucket), Some(key), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(LocatorError::Format);
        };

        if bucket.is_empty() || key.is_empty() {
            return Err(LocatorError::Empty);
        }

        Ok(Locator {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
        })
    }
}

fn validate(component: &str) -> Result<(), LocatorError> {
    if component.is_empty() {
        Err(LocatorError::Empty)
    } else if component.contains(SEPARATOR) {
        Err(LocatorError::Separator)
    } else {
        Ok(())
    }
}

impl std::str::FromStr for Locator {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.bucket, self.key)
    }
}
