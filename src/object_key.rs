use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

use crate::{aspect::AspectClass, error_code::ErrorCode};

const ID_BYTES: usize = 32;

#[derive(Debug, thiserror::Error)]
#[error("Failed to gather random bytes for object key")]
pub(crate) struct KeyError(#[source] getrandom::Error);

impl KeyError {
    pub(crate) const fn error_code(&self) -> ErrorCode {
        ErrorCode::ENTROPY_UNAVAILABLE
    }
}

/// Storage key of the form `{class}/{random id}{extension}`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct ObjectKey {
    inner: String,
}

impl ObjectKey {
    pub(crate) fn generate(class: AspectClass, media_type: &str) -> Result<Self, KeyError> {
        let mut bytes = [0u8; ID_BYTES];
        getrandom::getrandom(&mut bytes).map_err(KeyError)?;

        Ok(Self::from_parts(class, &bytes, media_type))
    }

    fn from_parts(class: AspectClass, bytes: &[u8], media_type: &str) -> Self {
        let id = URL_SAFE_NO_PAD.encode(bytes);
        let ext = extension(media_type);

        ObjectKey {
            inner: format!("{class}/{id}{ext}"),
        }
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.inner
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.inner)
    }
}

fn extension(media_type: &str) -> String {
    match media_type.split_once('/') {
        Some((_, subtype)) if !subtype.contains('/') => format!(".{subtype}"),
        _ => String::from(".bin"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{extension, ObjectKey};
    use crate::aspect::AspectClass;

    fn assert_shape(key: &ObjectKey, prefix: &str, ext: &str) {
        let rest = key
            .as_str()
            .strip_prefix(prefix)
            .expect("Key starts with class segment");
        let id = rest.strip_suffix(ext).expect("Key ends with extension");

        assert!(id.len() >= 22, "identifier too short: {id}");
        assert!(id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn extension_from_media_type() {
        assert_eq!(extension("video/mp4"), ".mp4");
        assert_eq!(extension("image/png"), ".png");
        assert_eq!(extension("mp4"), ".bin");
        assert_eq!(extension("video/mp4/extra"), ".bin");
        assert_eq!(extension(""), ".bin");
    }

    #[test]
    fn keys_are_namespaced_by_class() {
        let cases = [
            (AspectClass::Landscape, "landscape/"),
            (AspectClass::Portrait, "portrait/"),
            (AspectClass::Other, "other/"),
        ];

        for (class, prefix) in cases {
            let key = ObjectKey::generate(class, "video/mp4").expect("Generated key");
            assert_shape(&key, prefix, ".mp4");
        }
    }

    #[test]
    fn unknown_media_type_falls_back_to_bin() {
        let key = ObjectKey::generate(AspectClass::Other, "garbage").expect("Generated key");
        assert_shape(&key, "other/", ".bin");
    }

    #[test]
    fn identifier_is_unpadded_url_safe_base64() {
        let key = ObjectKey::from_parts(AspectClass::Landscape, &[0xfb; 32], "video/mp4");

        // 32 bytes encode to 43 characters without padding
        assert_eq!(
            key.as_str(),
            "landscape/-_v7-_v7-_v7-_v7-_v7-_v7-_v7-_v7-_v7-_v7-_s.mp4"
        );
    }

    #[test]
    fn keys_do_not_repeat() {
        let keys = (0..1000)
            .map(|_| ObjectKey::generate(AspectClass::Landscape, "video/mp4").unwrap())
            .collect::<HashSet<_>>();

        assert_eq!(keys.len(), 1000);
    }
}
