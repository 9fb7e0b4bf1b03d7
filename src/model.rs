mod config;
mod gist;
mod languages;

pub use self::config::{RemoteConfig, StoreConfig, StoreState};
pub use self::gist::{
    FileEntry, GistDraft, GistId, GistRecord, PendingState, Revision, language_for_filename,
    now_ts,
};
pub use self::languages::{
    LANGUAGES, LanguageDef, RAW_LANGUAGE, language_by_id, language_for_extension,
};
