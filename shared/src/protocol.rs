use serde::{de::DeserializeOwned, Serialize};

use crate::{
    connection::compression_config::CompressionConfig, link_conditioner::LinkConditionerConfig,
    world::{object_kinds::ObjectKinds, replicate::Replicate},
};

pub mod error;
pub use error::ProtocolError;

// Protocol
/// Everything publisher & subscriber must agree on before exchanging frames.
/// Both sides must register the same kinds in the same order.
pub struct Protocol {
    pub object_kinds: ObjectKinds,
    /// Configuration used to control compression parameters
    pub compression: Option<CompressionConfig>,
    /// Simulated network conditions applied to inbound frames
    pub link_condition: Option<LinkConditionerConfig>,
    locked: bool,
}

impl Default for Protocol {
    fn default() -> Self {
        Self {
            object_kinds: ObjectKinds::new(),
            compression: None,
            link_condition: None,
            locked: false,
        }
    }
}

impl Protocol {
    pub fn builder() -> Self {
        Self::default()
    }

    pub fn add_kind<T: Replicate + Serialize + DeserializeOwned>(&mut self) -> &mut Self {
        self.check_lock();
        self.object_kinds.add_kind::<T>();
        self
    }

    pub fn compression(&mut self, config: CompressionConfig) -> &mut Self {
        self.check_lock();
        self.compression = Some(config);
        self
    }

    pub fn link_condition(&mut self, config: LinkConditionerConfig) -> &mut Self {
        self.check_lock();
        self.link_condition = Some(config);
        self
    }

    // Non-panicking builder methods

    pub fn try_add_kind<T: Replicate + Serialize + DeserializeOwned>(
        &mut self,
    ) -> Result<&mut Self, ProtocolError> {
        self.try_check_lock()?;
        self.object_kinds.add_kind::<T>();
        Ok(self)
    }

    pub fn try_compression(&mut self, config: CompressionConfig) -> Result<&mut Self, ProtocolError> {
        self.try_check_lock()?;
        self.compression = Some(config);
        Ok(self)
    }

    pub fn try_link_condition(
        &mut self,
        config: LinkConditionerConfig,
    ) -> Result<&mut Self, ProtocolError> {
        self.try_check_lock()?;
        self.link_condition = Some(config);
        Ok(self)
    }

    pub fn try_lock(&mut self) -> Result<(), ProtocolError> {
        self.try_check_lock()?;
        self.locked = true;
        Ok(())
    }

    pub fn lock(&mut self) {
        self.check_lock();
        self.locked = true;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Checks if protocol is locked without panicking
    /// Returns Err if protocol is locked
    pub fn try_check_lock(&self) -> Result<(), ProtocolError> {
        if self.locked {
            Err(ProtocolError::AlreadyLocked)
        } else {
            Ok(())
        }
    }

    /// Checks if protocol is locked, panics if it is
    pub fn check_lock(&self) {
        if self.locked {
            panic!("Protocol already locked!");
        }
    }

    /// Takes the configured protocol out of the builder, leaving a fresh default behind
    pub fn build(&mut self) -> Self {
        std::mem::take(self)
    }
}
