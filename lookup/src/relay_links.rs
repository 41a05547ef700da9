use relay::SignedMediaRef;
use serde_json::Value;
use url::Url;

const MEDIA_PLAY_PATH: &str = "/aweme/v1/play";

// Fields of `video` that may hold a media-play URL, in order of preference
const MEDIA_URL_FIELDS: [&str; 2] = ["playAddr", "downloadAddr"];

/// Adds `video.relayUrl` to every post in `page.itemList` that has a
/// media-play URL. Returns how many posts got one.
pub fn add_relay_links(page: &mut Value, relay_path: &str) -> usize {
    let Some(items) = page.get_mut("itemList").and_then(Value::as_array_mut) else {
        return 0;
    };

    items
        .iter_mut()
        .map(|item| add_relay_link(item, relay_path))
        .filter(|added| *added)
        .count()
}

/// Adds `video.relayUrl` to a single post. Posts whose media URLs point
/// anywhere else are left alone.
pub fn add_relay_link(item: &mut Value, relay_path: &str) -> bool {
    let Some(video) = item.get_mut("video").and_then(Value::as_object_mut) else {
        return false;
    };

    let media_ref = MEDIA_URL_FIELDS
        .iter()
        .filter_map(|field| video.get(*field)?.as_str())
        .filter_map(|raw| Url::parse(raw).ok())
        .find(is_media_play_url)
        .map(|url| SignedMediaRef::from_play_url(&url));

    match media_ref {
        Some(media_ref) => {
            let relay_url = format!("{relay_path}?{}", media_ref.to_query_string());
            video.insert("relayUrl".to_string(), Value::String(relay_url));
            true
        }
        None => false,
    }
}

fn is_media_play_url(url: &Url) -> bool {
    url.path().trim_end_matches('/').ends_with(MEDIA_PLAY_PATH)
}
