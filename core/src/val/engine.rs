use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

/// Host-defined value carried by effect, event, location and talent slots.
///
/// The machine never looks inside; it only moves handles around and compares
/// them by identity.
pub trait EngineType: Any + Send + Sync + Debug {
    fn as_any(&self) -> &dyn Any;
}

/// Shared, immutable reference to an engine value.
pub type EngineHandle = Arc<dyn EngineType>;

impl dyn EngineType {
    pub fn downcast_ref<T: EngineType>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}
