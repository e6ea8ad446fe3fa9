pub mod api;
pub mod config;
pub mod favorites;
pub mod matcher;
pub mod metrics;
pub mod pagination;
pub mod search;
pub mod session;
pub mod storage;
pub mod testing;

pub use api::{
    DogApi, DogApiError, DogRecord, HttpDogApi, MatchResponse, PageCursor, SearchRequest,
    SearchResponse, SortDirection, SortField, SortOrder,
};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, ApiConfig, Config,
    ConfigError, StorageConfig, UserConfig,
};
pub use favorites::{FavoritesStore, PersistenceError, SharedFavorites, ToggleOutcome};
pub use matcher::{MatchError, MatchOrchestrator};
pub use pagination::{PageItem, PaginationView, PAGE_SIZE};
pub use search::{
    PageRequest, SearchController, SearchCriteria, SearchError, SearchOutcome, SearchSnapshot,
};
pub use session::{Session, SessionError, SessionEvent, SessionNotice, SessionState};
pub use storage::{KeyValueStorage, SqliteStorage, StorageError};
