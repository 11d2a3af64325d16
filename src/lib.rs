pub mod config;
pub mod error;
pub mod events;
pub mod tasks {
    pub mod fetcher;
    pub mod gallery;
    pub mod viewer;
}
