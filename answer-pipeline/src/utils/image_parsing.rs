use std::path::Path;

use async_openai::types::{
    ChatCompletionRequestMessageContentPartImageArgs,
    ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs, ImageDetail, ImageUrlArgs,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::error::AppError;

use crate::pipeline::ImageInput;

pub const ALLOWED_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "bmp", "webp"];

pub fn is_allowed_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Splits an optional `data:image/...;base64,` prefix from the payload.
/// Returns the declared MIME type, if any, and the bare base64 text.
pub fn strip_data_url_prefix(data: &str) -> (Option<&str>, &str) {
    let trimmed = data.trim();
    if trimmed.starts_with("data:image") {
        if let Some((header, payload)) = trimmed.split_once(',') {
            let mime = header
                .strip_prefix("data:")
                .and_then(|h| h.split(';').next())
                .filter(|m| !m.is_empty());
            return (mime, payload.trim());
        }
    }
    (None, trimmed)
}

/// Image format recognised from the leading bytes of the payload.
pub fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.starts_with(b"RIFF") && bytes.get(8..12) == Some(&b"WEBP"[..]) {
        Some("image/webp")
    } else if bytes.starts_with(b"BM") {
        Some("image/bmp")
    } else {
        None
    }
}

/// Validates base64 image data and wraps it for the backend.
///
/// The MIME type comes from the decoded bytes, not from a declared data-URL type.
pub fn decode_image_base64(data: &str) -> Result<ImageInput, AppError> {
    let (declared, payload) = strip_data_url_prefix(data);
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| AppError::Validation(format!("invalid base64 image data: {e}")))?;
    if bytes.is_empty() {
        return Err(AppError::Validation("image data is empty".into()));
    }
    let mime = sniff_image_mime(&bytes).ok_or_else(|| {
        AppError::Validation(format!(
            "payload is not a supported image (declared {})",
            declared.unwrap_or("none")
        ))
    })?;

    Ok(ImageInput {
        base64_data: payload.to_string(),
        mime_type: mime.to_string(),
    })
}

/// Reads an image file from disk and encodes it for the backend.
pub async fn load_image_file(path: &Path) -> Result<ImageInput, AppError> {
    if !is_allowed_file(path) {
        return Err(AppError::Validation(format!(
            "unsupported image type, allowed: {}",
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }

    let bytes = tokio::fs::read(path).await?;
    if bytes.is_empty() {
        return Err(AppError::Validation("image file is empty".into()));
    }

    // The extension gate above already limits files to image types.
    let mime_type = sniff_image_mime(&bytes).map_or_else(
        || mime_guess::from_path(path).first_or_octet_stream().to_string(),
        str::to_string,
    );

    Ok(ImageInput {
        base64_data: STANDARD.encode(&bytes),
        mime_type,
    })
}

pub fn create_image_request(
    model: &str,
    prompt: &str,
    image: &ImageInput,
) -> Result<CreateChatCompletionRequest, AppError> {
    let request = CreateChatCompletionRequestArgs::default()
        .model(model)
        .messages([ChatCompletionRequestUserMessageArgs::default()
            .content(vec![
                ChatCompletionRequestMessageContentPartTextArgs::default()
                    .text(prompt)
                    .build()?
                    .into(),
                ChatCompletionRequestMessageContentPartImageArgs::default()
                    .image_url(
                        ImageUrlArgs::default()
                            .url(image.data_url())
                            .detail(ImageDetail::High)
                            .build()?,
                    )
                    .build()?
                    .into(),
            ])
            .build()?
            .into()])
        .build()?;

    Ok(request)
}
