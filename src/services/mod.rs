pub mod poller;
pub mod proxy_client;
pub mod replicate;
