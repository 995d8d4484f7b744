//! Game search and selection
//!
//! Looks a game up by name in the public game index and lets an
//! [`AppSelector`] pick one of the hits. The selection UI itself lives with
//! the caller; this module only validates what it returns.

use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::resolver::config::ResolverConfig;
use crate::resolver::core::{AppId, ResolveError, Result};
use crate::resolver::http::{Fetcher, get_json};

/// One search hit
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GameInfo {
    #[serde(rename = "appid")]
    pub app_id: AppId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub schinese_name: String,
    #[serde(rename = "isfreeapp", default)]
    pub is_free_app: u8,
    #[serde(default)]
    pub update_time: String,
    #[serde(default)]
    pub change_number: u64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    games: Vec<GameInfo>,
}

/// Client for the game index
pub struct GameSearch {
    fetcher: Arc<dyn Fetcher>,
    search_url: String,
}

impl GameSearch {
    pub fn new(fetcher: Arc<dyn Fetcher>, search_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            search_url: search_url.into(),
        }
    }

    pub fn from_config(fetcher: Arc<dyn Fetcher>, config: &ResolverConfig) -> Self {
        Self::new(fetcher, config.search_url.clone())
    }

    /// Search the index for `name`
    pub async fn search(&self, name: &str) -> Result<Vec<GameInfo>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ResolveError::EmptyQuery);
        }
        let url = url::Url::parse_with_params(&self.search_url, &[("search", name)])?;
        let response: SearchResponse = get_json(self.fetcher.as_ref(), url.as_str()).await?;
        debug!("Search for '{}' returned {} games", name, response.games.len());
        Ok(response.games)
    }
}

/// Chooses one of the offered games, typically by asking the user
pub trait AppSelector {
    /// Failure of the selection surface itself
    type Error: From<ResolveError>;

    /// Index into `games` of the chosen entry
    fn choose(&self, games: &[GameInfo]) -> std::result::Result<usize, Self::Error>;
}

/// Validate a selection index against the offered games
pub fn select_game(games: &[GameInfo], index: usize) -> Result<&GameInfo> {
    if games.is_empty() {
        return Err(ResolveError::NotFound { what: "game".to_string() });
    }
    games.get(index).ok_or(ResolveError::SelectionOutOfRange {
        index,
        max: games.len() - 1,
    })
}

/// Ask `selector` for a game; an empty list fails before prompting
pub fn pick<'a, S>(selector: &S, games: &'a [GameInfo]) -> std::result::Result<&'a GameInfo, S::Error>
where
    S: AppSelector + ?Sized,
{
    if games.is_empty() {
        return Err(ResolveError::NotFound { what: "game".to_string() }.into());
    }
    let index = selector.choose(games)?;
    Ok(select_game(games, index)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::core::ErrorKind;
    use crate::resolver::http::HttpClient;
    use std::cell::Cell;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn game(id: u32, name: &str) -> GameInfo {
        GameInfo {
            app_id: AppId(id),
            name: name.to_string(),
            kind: "game".to_string(),
            schinese_name: String::new(),
            is_free_app: 0,
            update_time: String::new(),
            change_number: 0,
        }
    }

    struct FixedSelector {
        index: usize,
        asked: Cell<bool>,
    }

    impl AppSelector for FixedSelector {
        type Error = ResolveError;

        fn choose(&self, _games: &[GameInfo]) -> Result<usize> {
            self.asked.set(true);
            Ok(self.index)
        }
    }

    #[test]
    fn select_game_validates_range() {
        let games = vec![game(1, "a"), game(2, "b")];
        assert_eq!(select_game(&games, 1).unwrap().app_id, AppId(2));

        let err = select_game(&games, 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(matches!(err, ResolveError::SelectionOutOfRange { index: 2, max: 1 }));
    }

    #[test]
    fn empty_result_is_not_found() {
        let err = select_game(&[], 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "game not found");
    }

    #[test]
    fn pick_does_not_prompt_for_an_empty_list() {
        let selector = FixedSelector { index: 0, asked: Cell::new(false) };
        assert!(pick(&selector, &[]).is_err());
        assert!(!selector.asked.get());

        let games = vec![game(9, "z")];
        assert_eq!(pick(&selector, &games).unwrap().app_id, AppId(9));
        assert!(selector.asked.get());

        let wrong = FixedSelector { index: 4, asked: Cell::new(false) };
        assert!(matches!(
            pick(&wrong, &games),
            Err(ResolveError::SelectionOutOfRange { index: 4, max: 0 })
        ));
    }

    #[tokio::test]
    async fn search_queries_the_index_by_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/loadGames.php"))
            .and(query_param("search", "Hollow Knight"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"games":[{"appid":367520,"name":"Hollow Knight","type":"game","schinese_name":"空洞骑士","isfreeapp":0,"update_time":"2024-01-01","change_number":123}]}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let config = ResolverConfig::default().with_search_url(format!("{}/api/loadGames.php", server.uri()));
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpClient::from_config(&config).unwrap());
        let search = GameSearch::from_config(fetcher, &config);

        let games = search.search("  Hollow Knight ").await.unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].app_id, AppId(367520));
        assert_eq!(games[0].schinese_name, "空洞骑士");
    }

    #[tokio::test]
    async fn empty_query_fails_without_a_request() {
        let config = ResolverConfig::default();
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpClient::from_config(&config).unwrap());
        let search = GameSearch::from_config(fetcher, &config);
        assert!(matches!(search.search("   ").await, Err(ResolveError::EmptyQuery)));
    }
}
