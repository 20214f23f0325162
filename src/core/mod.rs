pub mod api_client;
pub mod capabilities;
pub mod direct_downloader;
pub mod events;
pub mod filename;
pub mod http_client;
pub mod registry;
pub mod url_parser;
