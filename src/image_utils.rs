use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

pub fn encode_image_base64(image_data: &[u8]) -> String {
    BASE64.encode(image_data)
}

pub fn decode_image_base64(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    BASE64.decode(encoded)
}

// The browser reports MIME types like "image/png"; anything else is not a
// candidate image.
pub fn is_image_mime(mime_type: &str) -> bool {
    mime_type.starts_with("image/")
}
