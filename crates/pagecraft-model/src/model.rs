#![forbid(unsafe_code)]

//! The model contract.
//!
//! A model is a typed view over one data node. Its state lives entirely in
//! that node (reachable through [`Model::data`]), so undoing an edit to the
//! data is undoing the edit to the model.
//!
//! Concrete types embed a [`ModelCore`], implement [`ModelType`], and get the
//! object-safe [`Model`] impl from [`impl_model!`](crate::impl_model).

use std::any::Any;
use std::rc::Rc;

use pagecraft_history::{Historian, ObjectRef, Value};

use crate::contract::validate_contract;
use crate::data_controller::DataController;
use crate::error::ModelError;
use crate::registry::TypeInfo;

/// Reserved key holding a model's type tag.
pub const TYPE_KEY: &str = "_type";

/// Shared handle to a model of any type.
pub type ModelRc = Rc<dyn Model>;

/// State every model carries: its type and its data.
#[derive(Debug, Clone)]
pub struct ModelCore {
    info: &'static TypeInfo,
    data: DataController,
}

impl ModelCore {
    /// Validate `node` against the type's contract and stamp its tag.
    ///
    /// The stamp is written off the record: building a model is never an
    /// undoable step.
    pub fn new(
        info: &'static TypeInfo,
        node: ObjectRef,
        historian: &Historian,
    ) -> Result<Self, ModelError> {
        validate_contract(info.tag, info.contract, &node)?;
        let data = DataController::new(node, historian);
        if data.get(TYPE_KEY).as_ref().and_then(Value::as_str) != Some(info.tag) {
            historian.off_the_record(|| data.set(TYPE_KEY, info.tag));
        }
        Ok(Self { info, data })
    }

    #[must_use]
    pub fn type_info(&self) -> &'static TypeInfo {
        self.info
    }

    #[must_use]
    pub fn data(&self) -> &DataController {
        &self.data
    }
}

/// Object-safe model interface.
pub trait Model: Any {
    fn core(&self) -> &ModelCore;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;

    fn type_info(&self) -> &'static TypeInfo {
        self.core().type_info()
    }

    fn data(&self) -> &DataController {
        self.core().data()
    }

    fn historian(&self) -> &Historian {
        self.data().historian()
    }

    /// The backing node.
    fn node(&self) -> &ObjectRef {
        self.data().raw()
    }

    /// Independent deep copy of this model's data.
    fn get_data(&self) -> serde_json::Value {
        self.data().clone_data()
    }

    fn get_prop(&self, prop: &str) -> Option<Value> {
        self.data().get(prop)
    }

    /// Build another model that records into this model's history.
    fn make_model<M: ModelType>(&self, data: serde_json::Value) -> Result<M, ModelError>
    where
        Self: Sized,
    {
        make_model(data, self.historian())
    }
}

impl dyn Model {
    #[must_use]
    pub fn is<T: Model>(&self) -> bool {
        self.as_any().is::<T>()
    }

    #[must_use]
    pub fn downcast_ref<T: Model>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }
}

/// A concrete model type with a static description.
pub trait ModelType: Model + Sized {
    const TYPE_INFO: &'static TypeInfo;

    fn from_node(node: ObjectRef, historian: &Historian) -> Result<Self, ModelError>;
}

/// Type-erased constructor for [`TypeInfo::construct`].
pub fn construct<T: ModelType>(
    node: ObjectRef,
    historian: &Historian,
) -> Result<ModelRc, ModelError> {
    Ok(Rc::new(T::from_node(node, historian)?))
}

/// Build a `T` from plain JSON, recording into `historian`.
pub fn make_model<T: ModelType>(
    data: serde_json::Value,
    historian: &Historian,
) -> Result<T, ModelError> {
    match Value::from(data) {
        Value::Object(node) => T::from_node(node, historian),
        other => Err(ModelError::invalid(T::TYPE_INFO.tag, "object", other.kind())),
    }
}

/// Recover the concrete type behind a shared model handle.
pub fn downcast_model<T: ModelType>(model: ModelRc) -> Option<Rc<T>> {
    if !model.is::<T>() {
        return None;
    }
    model.into_any().downcast::<T>().ok()
}

/// Implement [`Model`] for a type by naming the path to its [`ModelCore`].
///
/// ```ignore
/// struct Image { core: ModelCore }
/// impl_model!(Image, core);
///
/// struct TextBlock { block: BlockCore }
/// impl_model!(TextBlock, block.model);
/// ```
#[macro_export]
macro_rules! impl_model {
    ($ty:ty, $($field:ident).+) => {
        impl $crate::Model for $ty {
            fn core(&self) -> &$crate::ModelCore {
                &self.$($field).+
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn into_any(self: ::std::rc::Rc<Self>) -> ::std::rc::Rc<dyn ::std::any::Any> {
                self
            }
        }
    };
}
