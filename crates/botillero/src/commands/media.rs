//! Sticker conversion commands.

use crate::commands::{CommandHandler, Reply};
use crate::error::{AppError, AppResult};
use crate::platform::{CommandContext, Media};
use async_trait::async_trait;
use image::codecs::gif::{GifEncoder, Repeat};
use image::codecs::webp::WebPDecoder;
use image::{AnimationDecoder, Frame, ImageFormat};
use std::io::Cursor;
use tracing::{debug, error, warn};

const STICKER_SOURCES: &[&str] = &["image", "video", "gif"];

/// `!s`: turn the attached or quoted image/video into a sticker.
pub struct StickerHandler;

impl StickerHandler {
    async fn source_media(ctx: &CommandContext) -> AppResult<Option<Media>> {
        // Quoted media takes precedence over the command's own attachment.
        match &ctx.message.quoted {
            Some(quoted) if quoted.has_media => {
                if STICKER_SOURCES.contains(&quoted.media_type.as_str()) {
                    ctx.download_quoted_media().await
                } else {
                    Ok(None)
                }
            }
            _ if STICKER_SOURCES.contains(&ctx.message.media_type.as_str()) => {
                ctx.download_media().await
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl CommandHandler for StickerHandler {
    fn name(&self) -> &str {
        "s"
    }

    async fn execute(&self, ctx: &CommandContext) -> AppResult<Reply> {
        let media = match Self::source_media(ctx).await {
            Ok(Some(media)) => media,
            Ok(None) => {
                return Ok(
                    "Responde a una imagen o video, o envía uno junto al comando `!s`.".into(),
                )
            }
            Err(e) => {
                warn!("Sticker media download failed: {}", e);
                return Ok("Hubo un error al crear el sticker.".into());
            }
        };

        if let Err(e) = ctx.send_sticker(&media).await {
            error!("Sticker send failed: {}", e);
            return Ok("Hubo un error al crear el sticker.".into());
        }
        Ok(Reply::Handled)
    }
}

/// A sticker re-encoded into a format chat clients show as a picture.
#[derive(Debug)]
pub struct ConvertedImage {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
}

/// Decode a WebP sticker. Still stickers become PNG, animated ones become a
/// looping GIF.
pub fn convert_sticker(webp: &[u8], animated: bool) -> AppResult<ConvertedImage> {
    let still = image::load_from_memory_with_format(webp, ImageFormat::WebP)?;

    let mut out = Vec::new();
    if !animated {
        still.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)?;
        return Ok(ConvertedImage {
            bytes: out,
            extension: "png",
        });
    }

    let decoded =
        WebPDecoder::new(Cursor::new(webp)).and_then(|d| d.into_frames().collect_frames());
    let frames = match decoded {
        Ok(frames) if !frames.is_empty() => frames,
        Ok(_) => vec![Frame::new(still.to_rgba8())],
        Err(e) => {
            debug!("Falling back to a single frame: {}", e);
            vec![Frame::new(still.to_rgba8())]
        }
    };
    {
        let mut encoder = GifEncoder::new(&mut out);
        encoder.set_repeat(Repeat::Infinite)?;
        encoder.encode_frames(frames)?;
    }
    Ok(ConvertedImage {
        bytes: out,
        extension: "gif",
    })
}

/// `!toimg`: send a quoted sticker back as a regular image.
pub struct ToImageHandler;

impl ToImageHandler {
    async fn convert(ctx: &CommandContext, animated: bool) -> AppResult<()> {
        let media = ctx
            .download_quoted_media()
            .await?
            .ok_or_else(|| AppError::Command("sticker media no longer available".into()))?;
        let bytes = media
            .decode()
            .map_err(|e| AppError::Command(format!("invalid sticker data: {}", e)))?;
        if bytes.is_empty() {
            return Err(AppError::Command("empty sticker".into()));
        }

        let converted = tokio::task::spawn_blocking(move || convert_sticker(&bytes, animated))
            .await
            .map_err(|e| AppError::Command(format!("conversion task failed: {}", e)))??;

        // Removed when `file` goes out of scope, on every path.
        let file = tempfile::Builder::new()
            .prefix("sticker_")
            .suffix(&format!(".{}", converted.extension))
            .tempfile()?;
        tokio::fs::write(file.path(), &converted.bytes).await?;

        let path = file.path().to_string_lossy().into_owned();
        ctx.send_image(&path, Some("¡Aquí tienes!"))
            .await?
            .ok_or_else(|| AppError::Command("converted image could not be loaded".into()))?;
        Ok(())
    }
}

#[async_trait]
impl CommandHandler for ToImageHandler {
    fn name(&self) -> &str {
        "toimg"
    }

    fn aliases(&self) -> &[&'static str] {
        &["imagen"]
    }

    async fn execute(&self, ctx: &CommandContext) -> AppResult<Reply> {
        let Some(quoted) = &ctx.message.quoted else {
            return Ok("Para usar este comando, debes responder a un sticker.".into());
        };
        if !quoted.has_media || quoted.media_type != "sticker" {
            return Ok("Eso no parece ser un sticker.".into());
        }

        ctx.show_loading().await;
        match Self::convert(ctx, quoted.is_animated).await {
            Ok(()) => {
                ctx.react("✅").await;
                Ok(Reply::Handled)
            }
            Err(e) => {
                error!("Sticker conversion failed: {}", e);
                ctx.react("❌").await;
                Ok("Ucha, no pude convertir ese sticker. Puede que el formato no sea compatible."
                    .into())
            }
        }
    }
}
