pub mod collection_browser;
pub mod collections;
pub mod discovery;
pub mod genres;
pub mod paging;
pub mod providers;
pub mod session;

pub use collection_browser::{CollectionBrowser, CollectionListing, ListingTicket};
pub use collections::{
    CollectionMembership, CollectionSync, CollectionToggle, RefreshTicket, ToggleAction,
    ToggleTicket,
};
pub use discovery::{
    CatalogRequest, Discovery, DiscoveryController, DiscoverySnapshot, FetchTicket, Query,
    QueryKind,
};
pub use genres::GenreIndex;
pub use paging::{FetchOutcome, PagedResults, RequestToken, ResultsStatus};
pub use providers::{CollectionService, MovieCatalogService};
pub use session::{AuthService, HttpAuthService, SessionStore};
