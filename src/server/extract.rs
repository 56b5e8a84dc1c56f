//! Request decoding
//!
//! The two accepted input shapes become an explicit tagged enum instead of
//! ad hoc content sniffing: a multipart upload carrying an `image` file
//! field, or a JSON body whose `image` key holds raw base64 or a data URL.

use super::error::ApiError;
use super::models::RemoveBackgroundRequest;
use crate::error::{RemovalError, Result};
use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::Json;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

/// Multipart field that carries the uploaded image
const IMAGE_FIELD: &str = "image";

/// Decoded request shape for `POST /remove-background`
#[derive(Debug)]
pub enum ImagePayload {
    /// File field `image` from a multipart form body
    Upload {
        /// Client-supplied filename, if any
        filename: Option<String>,
        /// Raw file bytes
        bytes: Bytes,
    },
    /// `image` value from a JSON body: raw base64 or a data URL
    Encoded(String),
}

impl ImagePayload {
    /// Validate the payload and produce raw image bytes
    ///
    /// # Errors
    ///
    /// - `NoFileSelected` for an upload with an empty filename
    /// - `InvalidBase64` when the encoded payload does not decode
    /// - `EmptyImageData` when either path yields zero bytes
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        let bytes = match self {
            Self::Upload { filename, bytes } => {
                if filename.as_deref().unwrap_or("").is_empty() {
                    return Err(RemovalError::NoFileSelected);
                }
                bytes.to_vec()
            },
            Self::Encoded(value) => decode_base64_image(&value)?,
        };

        if bytes.is_empty() {
            return Err(RemovalError::EmptyImageData);
        }
        Ok(bytes)
    }
}

/// Decode a base64 payload, stripping a data-URL prefix when present
///
/// A data URL is recognized by its `data:image` prefix; everything up to and
/// including the first comma is dropped before decoding.
fn decode_base64_image(value: &str) -> Result<Vec<u8>> {
    let payload = if value.starts_with("data:image") {
        match value.split_once(',') {
            Some((_, payload)) => payload,
            None => value,
        }
    } else {
        value
    };

    BASE64
        .decode(payload)
        .map_err(|e| RemovalError::invalid_base64(e.to_string()))
}

impl<S> FromRequest<S> for ImagePayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let mut multipart = Multipart::from_request(req, state)
                .await
                .map_err(|_| ApiError::from(RemovalError::InvalidRequestFormat))?;

            while let Some(field) = multipart
                .next_field()
                .await
                .map_err(|_| ApiError::from(RemovalError::InvalidRequestFormat))?
            {
                if field.name() == Some(IMAGE_FIELD) {
                    let filename = field.file_name().map(ToString::to_string);
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|_| ApiError::from(RemovalError::InvalidRequestFormat))?;
                    return Ok(Self::Upload { filename, bytes });
                }
            }
            // No image field in the form: same failure as an unrecognized body
            return Err(ApiError::from(RemovalError::InvalidRequestFormat));
        }

        if content_type.starts_with("application/json") {
            let Json(body) = Json::<RemoveBackgroundRequest>::from_request(req, state)
                .await
                .map_err(|_| ApiError::from(RemovalError::InvalidRequestFormat))?;
            return match body.image {
                Some(value) => Ok(Self::Encoded(value)),
                None => Err(ApiError::from(RemovalError::MissingImageData)),
            };
        }

        Err(ApiError::from(RemovalError::InvalidRequestFormat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_base64_decodes() {
        let bytes = ImagePayload::Encoded(BASE64.encode(b"imagebytes"))
            .into_bytes()
            .unwrap();
        assert_eq!(bytes, b"imagebytes");
    }

    #[test]
    fn test_data_url_prefix_stripped() {
        let encoded = BASE64.encode(b"imagebytes");
        for prefix in ["data:image/png;base64", "data:image/jpeg;base64"] {
            let bytes = ImagePayload::Encoded(format!("{prefix},{encoded}"))
                .into_bytes()
                .unwrap();
            assert_eq!(bytes, b"imagebytes");
        }
    }

    #[test]
    fn test_data_url_roundtrip_is_byte_identical() {
        let original: Vec<u8> = (0u8..=255).collect();
        let data_url = format!("data:image/png;base64,{}", BASE64.encode(&original));
        let bytes = ImagePayload::Encoded(data_url).into_bytes().unwrap();
        assert_eq!(bytes, original);
    }

    #[test]
    fn test_malformed_base64_rejected() {
        let result = ImagePayload::Encoded("not-valid-base64!!!".to_string()).into_bytes();
        assert!(matches!(result, Err(RemovalError::InvalidBase64(_))));
    }

    #[test]
    fn test_data_url_without_comma_rejected() {
        let result = ImagePayload::Encoded("data:image/png;base64".to_string()).into_bytes();
        assert!(matches!(result, Err(RemovalError::InvalidBase64(_))));
    }

    #[test]
    fn test_empty_base64_payload_is_empty_image_data() {
        let result = ImagePayload::Encoded(String::new()).into_bytes();
        assert!(matches!(result, Err(RemovalError::EmptyImageData)));
    }

    #[test]
    fn test_empty_filename_rejected() {
        for filename in [None, Some(String::new())] {
            let result = ImagePayload::Upload {
                filename,
                bytes: Bytes::from_static(b"imagebytes"),
            }
            .into_bytes();
            assert!(matches!(result, Err(RemovalError::NoFileSelected)));
        }
    }

    #[test]
    fn test_empty_upload_is_empty_image_data() {
        let result = ImagePayload::Upload {
            filename: Some("photo.png".to_string()),
            bytes: Bytes::new(),
        }
        .into_bytes();
        assert!(matches!(result, Err(RemovalError::EmptyImageData)));
    }
}
