pub mod cache;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod images;
pub mod llm;
pub mod preferences;
pub mod session;

/// Operation ids dispatched through the `Run` RPC.
pub mod ops {
    pub const AGGREGATE_PREFERENCES: &str = "AggregatePreferences";
    pub const GENERATE_DESIGN: &str = "GenerateDesign";
    pub const FETCH_IMAGES: &str = "FetchImages";
}

pub mod rpc {
    pub mod designassistant {
        tonic::include_proto!("designassistant");
    }
}
