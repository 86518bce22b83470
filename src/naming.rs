use md5::{Digest, Md5};
use url::Url;

const HASH_LEN: usize = 10;
const DEFAULT_EXT: &str = ".jpg";

/// Content-type fragments and the extension they map to, checked in order.
const CONTENT_TYPE_EXTS: &[(&[&str], &str)] = &[
    (&["png"], ".png"),
    (&["jpeg", "jpg"], ".jpg"),
    (&["gif"], ".gif"),
    (&["webp"], ".webp"),
    (&["svg"], ".svg"),
    (&["bmp"], ".bmp"),
    (&["tiff"], ".tiff"),
];

const URL_PATH_EXTS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg", "bmp", "tiff"];

/// `image_<hash>.<ext>` for a source URL. Same inputs, same name.
pub fn image_filename(url: &str, content_type: Option<&str>) -> String {
    format!("image_{}{}", url_hash(url), image_extension(url, content_type))
}

/// First ten hex characters of the MD5 of the full URL.
pub fn url_hash(url: &str) -> String {
    let digest = Md5::digest(url.as_bytes());
    let mut hash = hex::encode(digest);
    hash.truncate(HASH_LEN);
    hash
}

/// Extension with a leading dot: content type first, then the URL path,
/// then `.jpg`.
pub fn image_extension(url: &str, content_type: Option<&str>) -> String {
    let ext = content_type
        .and_then(extension_from_content_type)
        .map(str::to_string)
        .or_else(|| extension_from_url(url))
        .unwrap_or_else(|| DEFAULT_EXT.to_string());

    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

fn extension_from_content_type(content_type: &str) -> Option<&'static str> {
    let lower = content_type.to_lowercase();
    CONTENT_TYPE_EXTS
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| lower.contains(n)))
        .map(|(_, ext)| *ext)
}

fn extension_from_url(url: &str) -> Option<String> {
    // An unparsable URL just means no hint.
    let parsed = Url::parse(url).ok()?;
    let file_name = parsed.path_segments()?.last()?;
    // Url already splits the query off, but percent-encoded `?` stays in the path.
    let file_name = file_name.split('?').next().unwrap_or(file_name);
    let (_, ext) = file_name.rsplit_once('.')?;
    let ext = ext.to_lowercase();
    URL_PATH_EXTS
        .contains(&ext.as_str())
        .then(|| format!(".{}", ext))
}
