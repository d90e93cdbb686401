use serde::{Deserialize, Serialize};

/// One timeline item extracted from the community feed.
///
/// `views` stays a string because that is how the upstream GraphQL API ships it;
/// aggregation parses it with a zero default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SocialPost {
    pub tweet_id: Option<String>,
    pub text: Option<String>,
    pub created_at: Option<String>,
    pub author_name: Option<String>,
    pub author_screen: Option<String>,
    #[serde(default)]
    pub followers_count: i64,
    #[serde(default)]
    pub retweet_count: i64,
    #[serde(default)]
    pub reply_count: i64,
    #[serde(default)]
    pub favorite_count: i64,
    #[serde(default)]
    pub views: String,
}

/// Community metadata from the fetchOne query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommunityProfile {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub member_count: Option<i64>,
    pub admin: CommunityAdmin,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommunityAdmin {
    pub name: Option<String>,
    pub screen_name: Option<String>,
    pub followers: Option<i64>,
    pub statuses: Option<i64>,
    pub bio: Option<String>,
}

/// Result of one named social sub-fetch: either the parsed payload or a typed
/// error marker (`{"error": "non_200"}` / `{"error": "not_json"}`). A failing
/// sub-fetch never fails the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FetchOutcome<T> {
    Ok(T),
    Err(FetchError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchError {
    pub error: String,
}

impl<T> FetchOutcome<T> {
    pub fn err(kind: &str) -> Self {
        FetchOutcome::Err(FetchError {
            error: kind.to_string(),
        })
    }

    pub fn as_ok(&self) -> Option<&T> {
        match self {
            FetchOutcome::Ok(v) => Some(v),
            FetchOutcome::Err(_) => None,
        }
    }
}

/// Combined social fetch for one cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XData {
    pub timeline: FetchOutcome<Vec<SocialPost>>,
    #[serde(rename = "fetchOne")]
    pub fetch_one: FetchOutcome<CommunityProfile>,
}

impl XData {
    /// Empty result used while the tracker is unconfigured or a batch is skipped.
    pub fn empty() -> Self {
        Self {
            timeline: FetchOutcome::Ok(Vec::new()),
            fetch_one: FetchOutcome::Ok(CommunityProfile::default()),
        }
    }

    /// Timeline posts for aggregation; an error marker reads as an empty slice.
    pub fn posts(&self) -> &[SocialPost] {
        self.timeline.as_ok().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn member_count(&self) -> i64 {
        self.fetch_one
            .as_ok()
            .and_then(|p| p.member_count)
            .unwrap_or(0)
    }
}

impl Default for XData {
    fn default() -> Self {
        Self::empty()
    }
}

/// First-seen author handle with its follower count, deduplicated per cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorFollowers {
    pub author: String,
    pub followers: i64,
    pub author_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_marker_serializes_to_wire_shape() {
        let outcome: FetchOutcome<Vec<SocialPost>> = FetchOutcome::err("not_json");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json, serde_json::json!({"error": "not_json"}));
    }

    #[test]
    fn ok_timeline_serializes_to_plain_list() {
        let outcome: FetchOutcome<Vec<SocialPost>> = FetchOutcome::Ok(vec![]);
        let json = serde_json::to_value(&outcome).unwrap();
        assert!(json.is_array());
    }

    #[test]
    fn errored_timeline_reads_as_empty() {
        let data = XData {
            timeline: FetchOutcome::err("non_200"),
            fetch_one: FetchOutcome::Ok(CommunityProfile::default()),
        };
        assert!(data.posts().is_empty());
    }
}
