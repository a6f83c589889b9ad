use serde_json::{Value, json};

use crate::ports::youtube_music::SearchFilter;
use crate::youtube_music_rs::{InnerTubeClient, InnerTubeError};

const FILTERED_PARAM_PREFIX: &str = "EgWKAQ";
const SPELLING_SUFFIX: &str = "AWoMEA4QChADEAQQCRAF";
const IGNORE_SPELLING_SUFFIX: &str = "AUICCAFqDBAOEAoQAxAEEAkQBQ%3D%3D";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResultItem {
    pub video_id: String,
    pub title: Option<String>,
}

/// Opaque `params` value that restricts a search to one result shelf.
pub fn search_params(filter: SearchFilter, ignore_spelling: bool) -> String {
    let kind = match filter {
        SearchFilter::Songs => "II",
        SearchFilter::Videos => "IQ",
    };
    let suffix = if ignore_spelling {
        IGNORE_SPELLING_SUFFIX
    } else {
        SPELLING_SUFFIX
    };
    format!("{FILTERED_PARAM_PREFIX}{kind}{suffix}")
}

/// Search YouTube Music, returning playable results in ranking order.
pub async fn search(
    client: &InnerTubeClient,
    query: &str,
    filter: SearchFilter,
    ignore_spelling: bool,
) -> Result<Vec<SearchResultItem>, InnerTubeError> {
    let body = json!({
        "query": query,
        "params": search_params(filter, ignore_spelling),
    });
    let response = client.post("search", body).await?;
    Ok(parse_search_results(&response))
}

/// Extract results from a search response. Entries without a video id
/// (artists, albums, episodes without playback) are skipped.
pub fn parse_search_results(response: &Value) -> Vec<SearchResultItem> {
    let sections = response
        .pointer("/contents/tabbedSearchResultsRenderer/tabs/0/tabRenderer/content/sectionListRenderer/contents")
        .or_else(|| response.pointer("/contents/sectionListRenderer/contents"))
        .and_then(Value::as_array);

    let Some(sections) = sections else {
        return Vec::new();
    };

    sections
        .iter()
        .filter_map(|section| section.pointer("/musicShelfRenderer/contents"))
        .filter_map(Value::as_array)
        .flatten()
        .filter_map(|item| item.get("musicResponsiveListItemRenderer"))
        .filter_map(parse_item)
        .collect()
}

fn parse_item(renderer: &Value) -> Option<SearchResultItem> {
    let video_id = renderer
        .pointer("/playlistItemData/videoId")
        .or_else(|| {
            renderer.pointer(
                "/overlay/musicItemThumbnailOverlayRenderer/content/musicPlayButtonRenderer/playNavigationEndpoint/watchEndpoint/videoId",
            )
        })
        .and_then(Value::as_str)?;

    let title = renderer
        .pointer("/flexColumns/0/musicResponsiveListItemFlexColumnRenderer/text/runs/0/text")
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(SearchResultItem {
        video_id: video_id.to_string(),
        title,
    })
}
