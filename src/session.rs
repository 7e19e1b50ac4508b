use tracing::warn;

use crate::cache::DesignCache;
use crate::config::Config;
use crate::error::ValidationError;
use crate::images::ImageClient;
use crate::llm::{self, DesignClient};
use crate::preferences::{
    self, DesignResult, DesignSource, ImageSet, PreferenceDescriptor, RawFields, RoomPlanner,
};

/// All per-session state in one place: the design cache, the room planner
/// and the two upstream clients. One submission is processed to completion
/// before the next; everything here is dropped with the session.
pub struct DesignSession {
    design_client: DesignClient,
    image_client: ImageClient,
    cache: DesignCache,
    rooms: RoomPlanner,
}

impl DesignSession {
    pub fn new(config: &Config) -> Self {
        Self {
            design_client: DesignClient::new(config),
            image_client: ImageClient::new(config),
            cache: DesignCache::new(),
            rooms: RoomPlanner::new(),
        }
    }

    /// Room list edited between submissions. Hosts that send the full room
    /// list inside [`RawFields`] can ignore this.
    pub fn rooms_mut(&mut self) -> &mut RoomPlanner {
        &mut self.rooms
    }

    pub fn rooms(&self) -> &RoomPlanner {
        &self.rooms
    }

    pub fn cache(&self) -> &DesignCache {
        &self.cache
    }

    /// Validate the submitted fields and build the immutable descriptor.
    /// Rooms edited through the session planner are folded in when the
    /// payload itself carries none; flagged deletions are applied here, at
    /// submission time. On validation failure nothing is consumed and no
    /// upstream call happens.
    pub fn aggregate(&mut self, raw: &RawFields) -> Result<PreferenceDescriptor, ValidationError> {
        let mut descriptor = preferences::aggregate(raw)?;
        if descriptor.rooms.is_empty() && !self.rooms.is_empty() {
            let planner = std::mem::take(&mut self.rooms);
            descriptor.rooms = planner.commit();
        }
        Ok(descriptor)
    }

    /// Cached or freshly generated design plan. An upstream failure falls
    /// back to the deterministic local template, which is never cached so a
    /// later identical submission retries the upstream.
    pub async fn generate(&mut self, descriptor: &PreferenceDescriptor) -> DesignResult {
        let key = descriptor.cache_key();
        let client = &self.design_client;

        match self
            .cache
            .get_or_generate(&key, || client.generate_design(descriptor))
            .await
        {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "design generation failed, using fallback template");
                DesignResult {
                    markdown: llm::fallback_design(descriptor),
                    source: DesignSource::Fallback,
                }
            }
        }
    }

    /// Illustration URLs for the submission. Never fails; empty is a valid
    /// answer the host covers with its own fallback image.
    pub async fn fetch_images(&self, descriptor: &PreferenceDescriptor) -> ImageSet {
        self.image_client.fetch_images(descriptor).await
    }
}
