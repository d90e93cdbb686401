//! X community-API client.
//!
//! Fetches a fixed set of named GraphQL queries (community timeline, community
//! profile). Response bodies are sometimes compressed without a matching
//! Content-Encoding header, so undecodable bodies are sniffed for gzip and
//! brotli before giving up. A non-200 or non-JSON response produces a typed
//! error marker for that name only; the batch itself never fails.

use std::io::Read;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::social::{
    CommunityAdmin, CommunityProfile, FetchOutcome, SocialPost, XData,
};

const GRAPHQL_BASE: &str = "https://x.com/i/api/graphql";

const TIMELINE_QUERY_ID: &str = "Nyt-88UX4-pPCImZNUl9RQ/CommunityTweetsTimeline";
const FETCH_ONE_QUERY_ID: &str = "pbuqwPzh0Ynrw8RQY3esYA/CommunitiesFetchOneQuery";

const TIMELINE_FEATURES: &str = "%7B%22rweb_video_screen_enabled%22%3Afalse%2C%22payments_enabled%22%3Afalse%2C%22rweb_xchat_enabled%22%3Afalse%2C%22profile_label_improvements_pcf_label_in_post_enabled%22%3Atrue%2C%22rweb_tipjar_consumption_enabled%22%3Atrue%2C%22verified_phone_label_enabled%22%3Atrue%2C%22creator_subscriptions_tweet_preview_api_enabled%22%3Atrue%2C%22responsive_web_graphql_timeline_navigation_enabled%22%3Atrue%2C%22responsive_web_graphql_skip_user_profile_image_extensions_enabled%22%3Afalse%2C%22premium_content_api_read_enabled%22%3Afalse%2C%22communities_web_enable_tweet_community_results_fetch%22%3Atrue%2C%22c9s_tweet_anatomy_moderator_badge_enabled%22%3Atrue%2C%22responsive_web_grok_analyze_button_fetch_trends_enabled%22%3Afalse%2C%22responsive_web_grok_analyze_post_followups_enabled%22%3Atrue%2C%22responsive_web_jetfuel_frame%22%3Atrue%2C%22responsive_web_grok_share_attachment_enabled%22%3Atrue%2C%22articles_preview_enabled%22%3Atrue%2C%22responsive_web_edit_tweet_api_enabled%22%3Atrue%2C%22graphql_is_translatable_rweb_tweet_is_translatable_enabled%22%3Atrue%2C%22view_counts_everywhere_api_enabled%22%3Atrue%2C%22longform_notetweets_consumption_enabled%22%3Atrue%2C%22responsive_web_twitter_article_tweet_consumption_enabled%22%3Atrue%2C%22tweet_awards_web_tipping_enabled%22%3Afalse%2C%22responsive_web_grok_show_grok_translated_post%22%3Atrue%2C%22responsive_web_grok_analysis_button_from_backend%22%3Atrue%2C%22creator_subscriptions_quote_tweet_preview_enabled%22%3Afalse%2C%22freedom_of_speech_not_reach_fetch_enabled%22%3Atrue%2C%22standardized_nudges_misinfo%22%3Atrue%2C%22tweet_with_visibility_results_prefer_gql_limited_actions_policy_enabled%22%3Atrue%2C%22longform_notetweets_rich_text_read_enabled%22%3Atrue%2C%22longform_notetweets_inline_media_enabled%22%3Atrue%2C%22responsive_web_grok_image_annotation_enabled%22%3Atrue%2C%22responsive_web_grok_imagine_annotation_enabled%22%3Atrue%2C%22responsive_web_grok_community_note_auto_translation_is_enabled%22%3Afalse%2C%22responsive_web_enhance_cards_enabled%22%3Afalse%7D";

const FETCH_ONE_FEATURES: &str = "%7B%22payments_enabled%22%3Afalse%2C%22profile_label_improvements_pcf_label_in_post_enabled%22%3Atrue%2C%22responsive_web_graphql_skip_user_profile_image_extensions_enabled%22%3Afalse%2C%22responsive_web_graphql_timeline_navigation_enabled%22%3Atrue%2C%22rweb_tipjar_consumption_enabled%22%3Atrue%2C%22verified_phone_label_enabled%22%3Atrue%7D";

/// Static credentials for the community API; configuration data, not logic.
#[derive(Debug, Clone, Default)]
pub struct XCredentials {
    pub bearer_token: Option<String>,
    pub cookie: Option<String>,
    pub csrf_token: Option<String>,
}

impl XCredentials {
    pub fn from_env() -> Self {
        Self {
            bearer_token: std::env::var("X_BEARER_TOKEN").ok(),
            cookie: std::env::var("X_COOKIE").ok(),
            csrf_token: std::env::var("X_CSRF_TOKEN").ok(),
        }
    }
}

#[derive(Clone)]
pub struct XApiService {
    client: Client,
    credentials: XCredentials,
}

impl XApiService {
    pub fn new(credentials: XCredentials) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            credentials,
        }
    }

    /// Run the named sub-fetches for one community. Each name resolves to its
    /// parsed payload or an error marker; this never returns a batch failure.
    pub async fn fetch_social_data(&self, community_id: &str) -> XData {
        let timeline_url = format!(
            "{GRAPHQL_BASE}/{TIMELINE_QUERY_ID}?variables=%7B%22communityId%22%3A%22{community_id}%22%2C%22count%22%3A20%2C%22displayLocation%22%3A%22Community%22%2C%22rankingMode%22%3A%22Relevance%22%2C%22withCommunity%22%3Atrue%7D&features={TIMELINE_FEATURES}"
        );
        let fetch_one_url = format!(
            "{GRAPHQL_BASE}/{FETCH_ONE_QUERY_ID}?variables=%7B%22communityId%22%3A%22{community_id}%22%2C%22withDmMuting%22%3Afalse%2C%22withGrokTranslatedBio%22%3Afalse%7D&features={FETCH_ONE_FEATURES}"
        );

        let timeline = match self.fetch_named("timeline", &timeline_url).await {
            FetchOutcome::Ok(raw) => FetchOutcome::Ok(parse_timeline(&raw)),
            FetchOutcome::Err(marker) => FetchOutcome::Err(marker),
        };
        let fetch_one = match self.fetch_named("fetchOne", &fetch_one_url).await {
            FetchOutcome::Ok(raw) => FetchOutcome::Ok(parse_community_profile(&raw)),
            FetchOutcome::Err(marker) => FetchOutcome::Err(marker),
        };

        XData {
            timeline,
            fetch_one,
        }
    }

    async fn fetch_named(&self, name: &str, url: &str) -> FetchOutcome<Value> {
        let mut request = self
            .client
            .get(url)
            .header("accept", "*/*")
            .header("content-type", "application/json")
            .header(
                "user-agent",
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/140.0.0.0 Safari/537.36",
            );
        if let Some(bearer) = &self.credentials.bearer_token {
            request = request.header("authorization", format!("Bearer {bearer}"));
        }
        if let Some(cookie) = &self.credentials.cookie {
            request = request.header("cookie", cookie);
        }
        if let Some(csrf) = &self.credentials.csrf_token {
            request = request.header("x-csrf-token", csrf);
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("x {} fetch failed: {}", name, e);
                return FetchOutcome::err(&e.to_string());
            }
        };

        if !response.status().is_success() {
            warn!("x {} returned {}", name, response.status());
            return FetchOutcome::err("non_200");
        }

        let raw = match response.bytes().await {
            Ok(b) => b,
            Err(e) => {
                warn!("x {} body read failed: {}", name, e);
                return FetchOutcome::err(&e.to_string());
            }
        };

        match parse_payload(&raw) {
            Some(value) => {
                debug!("x {} fetched {} bytes", name, raw.len());
                FetchOutcome::Ok(value)
            }
            None => {
                warn!("x {} returned a non-JSON body", name);
                FetchOutcome::err("not_json")
            }
        }
    }
}

/// Decode a response body into JSON, tolerating compression that disagrees with
/// the declared encoding. Returns None when nothing decodable remains.
pub fn parse_payload(raw: &[u8]) -> Option<Value> {
    serde_json::from_str(&decode_body(raw)).ok()
}

/// Best-effort body decode: gzip magic first, then a brotli attempt, then the
/// bytes as (lossy) UTF-8 text.
fn decode_body(raw: &[u8]) -> String {
    if raw.starts_with(&[0x1f, 0x8b]) {
        let mut out = String::new();
        if flate2::read::GzDecoder::new(raw)
            .read_to_string(&mut out)
            .is_ok()
        {
            return out;
        }
    } else if serde_json::from_slice::<Value>(raw).is_err() {
        let mut out = Vec::new();
        if brotli::Decompressor::new(raw, 4096)
            .read_to_end(&mut out)
            .is_ok()
        {
            if let Ok(text) = String::from_utf8(out) {
                return text;
            }
        }
    }
    String::from_utf8_lossy(raw).into_owned()
}

/// Walk the ranked community timeline and keep entries whose nested type
/// discriminator marks them as tweets. Malformed entries are skipped;
/// insertion order follows the API response.
pub fn parse_timeline(raw: &Value) -> Vec<SocialPost> {
    let instructions = raw
        .pointer("/data/communityResults/result/ranked_community_timeline/timeline/instructions")
        .and_then(Value::as_array);

    let mut posts = Vec::new();
    for instruction in instructions.into_iter().flatten() {
        if instruction.get("type").and_then(Value::as_str) != Some("TimelineAddEntries") {
            continue;
        }
        for entry in instruction
            .get("entries")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
        {
            let Some(tweet) = entry.pointer("/content/itemContent/tweet_results/result") else {
                continue;
            };
            if tweet.get("__typename").and_then(Value::as_str) != Some("Tweet") {
                continue;
            }

            let legacy = tweet.get("legacy").cloned().unwrap_or(Value::Null);
            let user = tweet
                .pointer("/core/user_results/result")
                .cloned()
                .unwrap_or(Value::Null);

            posts.push(SocialPost {
                tweet_id: str_at(tweet, "/rest_id"),
                text: str_at(&legacy, "/full_text"),
                created_at: str_at(&legacy, "/created_at"),
                author_name: str_at(&user, "/core/name"),
                author_screen: str_at(&user, "/core/screen_name"),
                followers_count: i64_at(&user, "/legacy/followers_count"),
                retweet_count: i64_at(&legacy, "/retweet_count"),
                reply_count: i64_at(&legacy, "/reply_count"),
                favorite_count: i64_at(&legacy, "/favorite_count"),
                views: str_at(tweet, "/views/count").unwrap_or_else(|| "0".to_string()),
            });
        }
    }
    posts
}

/// Flatten the community profile out of the fetchOne payload. Missing fields
/// stay None.
pub fn parse_community_profile(raw: &Value) -> CommunityProfile {
    let community = raw
        .pointer("/data/communityResults/result")
        .cloned()
        .unwrap_or(Value::Null);
    let admin = community
        .pointer("/admin_results/result")
        .cloned()
        .unwrap_or(Value::Null);

    CommunityProfile {
        id: str_at(&community, "/id_str"),
        name: str_at(&community, "/name"),
        description: str_at(&community, "/description"),
        member_count: community
            .get("member_count")
            .and_then(Value::as_i64),
        admin: CommunityAdmin {
            name: str_at(&admin, "/core/name"),
            screen_name: str_at(&admin, "/core/screen_name"),
            followers: admin.pointer("/legacy/followers_count").and_then(Value::as_i64),
            statuses: admin.pointer("/legacy/statuses_count").and_then(Value::as_i64),
            bio: str_at(&admin, "/legacy/description"),
        },
    }
}

fn str_at(value: &Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn i64_at(value: &Value, pointer: &str) -> i64 {
    value.pointer(pointer).and_then(Value::as_i64).unwrap_or(0)
}
