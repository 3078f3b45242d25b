//! Tag reading and the fallbacks applied when tags are missing.
//!
//! `resolve_with` never fails: a file that cannot be parsed still becomes a
//! `Track` titled after its file name.

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe, PanicHookInfo, catch_unwind};
use std::path::Path;
use std::sync::Once;
use std::time::Duration;

use base64::prelude::*;
use lofty::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

use super::model::Track;

/// Pictures above this size are not turned into cover art by default.
pub const DEFAULT_MAX_COVER_BYTES: usize = 5 * 1024 * 1024;

/// Tag fields as read from a file, before any fallback is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub pictures: Vec<RawPicture>,
    pub duration: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPicture {
    pub mime_type: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum TagError {
    #[error("{0}")]
    Read(String),
    #[error("tag parser panicked")]
    Panicked,
}

/// Source of embedded tags.
#[cfg_attr(test, mockall::automock)]
pub trait TagReader: Send + Sync {
    fn read_tags(&self, path: &Path) -> Result<RawTags, TagError>;
}

/// Reads tags with `lofty`, preferring the file's primary tag.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyTagReader;

impl TagReader for LoftyTagReader {
    fn read_tags(&self, path: &Path) -> Result<RawTags, TagError> {
        // Malformed files can make the parser panic; treat that like any other bad file.
        let tagged = quietly(|| lofty::read_from_path(path))?
            .map_err(|e| TagError::Read(e.to_string()))?;

        let duration = Some(tagged.properties().duration()).filter(|d| !d.is_zero());
        let mut raw = RawTags {
            duration,
            ..RawTags::default()
        };

        if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
            raw.title = non_blank(tag.title().map(|v| v.into_owned()));
            raw.artist = non_blank(tag.artist().map(|v| v.into_owned()));
            raw.album = non_blank(tag.album().map(|v| v.into_owned()));
            raw.pictures = tag
                .pictures()
                .iter()
                .map(|p| RawPicture {
                    mime_type: p.mime_type().map(ToString::to_string),
                    data: p.data().to_vec(),
                })
                .collect();
        }

        Ok(raw)
    }
}

thread_local! {
    static QUIET_PANICS: Cell<bool> = const { Cell::new(false) };
}

static QUIET_HOOK: Once = Once::new();

/// Run `f`, turning a panic into [`TagError::Panicked`].
///
/// While `f` runs, the panic message goes to the log instead of stderr,
/// which the terminal UI owns. Panics on other threads keep the previous hook.
fn quietly<T>(f: impl FnOnce() -> T) -> Result<T, TagError> {
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info: &PanicHookInfo<'_>| {
            if QUIET_PANICS.with(Cell::get) {
                warn!(panic = %panic_message(info), location = ?info.location(), "tag parser panicked");
            } else {
                previous(info);
            }
        }));
    });

    QUIET_PANICS.with(|q| q.set(true));
    let result = catch_unwind(AssertUnwindSafe(f));
    QUIET_PANICS.with(|q| q.set(false));
    result.map_err(|_| TagError::Panicked)
}

fn panic_message(info: &PanicHookInfo<'_>) -> String {
    let payload = info.payload();
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Resolve `path` with the default tag reader and cover size limit.
#[cfg(test)]
pub fn resolve(path: &Path) -> Track {
    resolve_with(&LoftyTagReader, path, DEFAULT_MAX_COVER_BYTES)
}

/// Resolve `path` with `reader`. Never fails; see [`Track::fallback`].
pub fn resolve_with<R: TagReader + ?Sized>(reader: &R, path: &Path, max_cover_bytes: usize) -> Track {
    match reader.read_tags(path) {
        Ok(tags) => track_from_tags(path, tags, max_cover_bytes),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no readable tags, using file name");
            Track::fallback(path)
        }
    }
}

fn track_from_tags(path: &Path, tags: RawTags, max_cover_bytes: usize) -> Track {
    let fallback = Track::fallback(path);
    let cover = tags
        .pictures
        .first()
        .and_then(|p| cover_data_uri(p, max_cover_bytes));

    Track {
        path: fallback.path,
        title: non_blank(tags.title).unwrap_or(fallback.title),
        artist: non_blank(tags.artist).unwrap_or(fallback.artist),
        album: non_blank(tags.album).unwrap_or(fallback.album),
        cover,
        duration: tags.duration,
    }
}

/// Encode a picture as `data:<mime>;base64,<payload>`.
pub fn cover_data_uri(picture: &RawPicture, max_bytes: usize) -> Option<String> {
    if picture.data.is_empty() || picture.data.len() > max_bytes {
        return None;
    }
    let mime = picture
        .mime_type
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or("application/octet-stream");
    Some(format!(
        "data:{};base64,{}",
        mime,
        BASE64_STANDARD.encode(&picture.data)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::model::{UNKNOWN_ALBUM, UNKNOWN_ARTIST};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn png(data: &[u8]) -> RawPicture {
        RawPicture {
            mime_type: Some("image/png".into()),
            data: data.to_vec(),
        }
    }

    #[test]
    fn untagged_file_falls_back_to_file_stem_and_placeholders() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Morning Song.mp3");
        fs::write(&path, b"not a real mp3").unwrap();

        let track = resolve(&path);
        assert_eq!(track.path, path);
        assert_eq!(track.title, "Morning Song");
        assert_eq!(track.artist, UNKNOWN_ARTIST);
        assert_eq!(track.album, UNKNOWN_ALBUM);
        assert_eq!(track.cover, None);
    }

    #[test]
    fn nonexistent_file_still_resolves() {
        let track = resolve(Path::new("/definitely/not/here/ghost.mp3"));
        assert_eq!(track.title, "ghost");
        assert_eq!(track.artist, UNKNOWN_ARTIST);
        assert_eq!(track.duration, None);
    }

    #[test]
    fn present_fields_win_and_missing_ones_fall_back_individually() {
        let mut reader = MockTagReader::new();
        reader.expect_read_tags().returning(|_| {
            Ok(RawTags {
                title: Some("  Real Title ".into()),
                artist: None,
                album: Some("   ".into()),
                pictures: vec![],
                duration: Some(Duration::from_secs(61)),
            })
        });

        let track = resolve_with(&reader, Path::new("/music/file.mp3"), DEFAULT_MAX_COVER_BYTES);
        assert_eq!(track.title, "Real Title");
        assert_eq!(track.artist, UNKNOWN_ARTIST);
        assert_eq!(track.album, UNKNOWN_ALBUM);
        assert_eq!(track.duration, Some(Duration::from_secs(61)));
    }

    #[test]
    fn reader_errors_are_absorbed() {
        let mut reader = MockTagReader::new();
        reader
            .expect_read_tags()
            .times(2)
            .returning(|_| Err(TagError::Read("corrupt frame".into())));

        let path = PathBuf::from("/music/broken.MP3");
        assert_eq!(
            resolve_with(&reader, &path, DEFAULT_MAX_COVER_BYTES),
            Track::fallback(&path)
        );
        assert_eq!(resolve_with(&reader, &path, DEFAULT_MAX_COVER_BYTES).title, "broken");
    }

    #[test]
    fn first_picture_becomes_a_data_uri() {
        let mut reader = MockTagReader::new();
        reader.expect_read_tags().returning(|_| {
            Ok(RawTags {
                pictures: vec![png(b"abc"), png(b"ignored")],
                ..RawTags::default()
            })
        });

        let track = resolve_with(&reader, Path::new("/m/a.mp3"), DEFAULT_MAX_COVER_BYTES);
        assert_eq!(track.cover.as_deref(), Some("data:image/png;base64,YWJj"));
    }

    #[test]
    fn cover_data_uri_handles_missing_mime_and_size_limit() {
        let pic = RawPicture {
            mime_type: None,
            data: vec![0xff, 0xd8],
        };
        assert_eq!(
            cover_data_uri(&pic, 16).as_deref(),
            Some("data:application/octet-stream;base64,/9g=")
        );
        assert_eq!(cover_data_uri(&png(b"abcd"), 3), None);
        assert_eq!(cover_data_uri(&png(b""), 16), None);
    }

    fn syncsafe(n: usize) -> [u8; 4] {
        [
            ((n >> 21) & 0x7f) as u8,
            ((n >> 14) & 0x7f) as u8,
            ((n >> 7) & 0x7f) as u8,
            (n & 0x7f) as u8,
        ]
    }

    fn id3v24_frame(id: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut frame = id.to_vec();
        frame.extend(syncsafe(body.len()));
        frame.extend([0, 0]);
        frame.extend(body);
        frame
    }

    fn text_frame(id: &[u8; 4], text: &str) -> Vec<u8> {
        let mut body = vec![3u8]; // UTF-8
        body.extend(text.as_bytes());
        id3v24_frame(id, &body)
    }

    /// ID3v2.4 tag with title, artist, album and a front cover, followed by
    /// a run of silent 128 kbit/s MPEG-1 Layer III frames.
    fn tagged_mp3(cover: &[u8]) -> Vec<u8> {
        let mut frames = Vec::new();
        frames.extend(text_frame(b"TIT2", "Night Drive"));
        frames.extend(text_frame(b"TPE1", "The Band"));
        frames.extend(text_frame(b"TALB", "Roads"));
        let mut apic = vec![0u8];
        apic.extend(b"image/png\0");
        apic.push(3); // front cover
        apic.push(0); // empty description
        apic.extend(cover);
        frames.extend(id3v24_frame(b"APIC", &apic));

        let mut file = b"ID3".to_vec();
        file.extend([4, 0, 0]);
        file.extend(syncsafe(frames.len()));
        file.extend(frames);

        let mut audio_frame = vec![0xff, 0xfb, 0x90, 0x64];
        audio_frame.resize(417, 0);
        for _ in 0..20 {
            file.extend(&audio_frame);
        }
        file
    }

    #[test]
    fn lofty_reads_tags_and_cover_from_a_real_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("track01.mp3");
        let cover = b"\x89PNG\r\n\x1a\nfake image";
        fs::write(&path, tagged_mp3(cover)).unwrap();

        let raw = LoftyTagReader.read_tags(&path).unwrap();
        assert_eq!(raw.title.as_deref(), Some("Night Drive"));
        assert_eq!(raw.artist.as_deref(), Some("The Band"));
        assert_eq!(raw.album.as_deref(), Some("Roads"));
        assert_eq!(raw.pictures.len(), 1);
        assert_eq!(raw.pictures[0].mime_type.as_deref(), Some("image/png"));
        assert_eq!(raw.pictures[0].data, cover);

        let track = resolve_with(&LoftyTagReader, &path, DEFAULT_MAX_COVER_BYTES);
        assert_eq!(track.title, "Night Drive");
        assert_eq!(track.subtitle(" - "), "The Band - Roads");
        assert_eq!(
            track.cover.as_deref(),
            Some(format!("data:image/png;base64,{}", BASE64_STANDARD.encode(cover)).as_str())
        );
    }

    #[test]
    fn parser_panics_become_tag_errors() {
        let result: Result<(), TagError> = quietly(|| panic!("bad frame"));
        assert!(matches!(result, Err(TagError::Panicked)));
        assert!(!QUIET_PANICS.with(Cell::get));

        assert!(matches!(quietly(|| 7), Ok(7)));
    }
}
