#![forbid(unsafe_code)]

//! Process-wide type table. Kept in its own binary: these tests replace the
//! table and run one after another inside a single test.

use pagecraft_history::{Historian, ObjectRef, ValueKind};
use pagecraft_model::{
    FieldSpec, ModelCore, ModelError, ModelType, Morph, MorphOne, Relation, RelationOptions,
    TypeConstraint, TypeInfo, TypeMap, construct, default_types, impl_model, make_model,
    resolve_type, set_default_type_map,
};
use serde_json::json;

#[derive(Debug)]
struct Quote {
    core: ModelCore,
}
impl_model!(Quote, core);

impl ModelType for Quote {
    const TYPE_INFO: &'static TypeInfo = &TypeInfo {
        tag: "quote",
        lineage: &[],
        contract: &[FieldSpec::required("text", ValueKind::String)],
        construct: construct::<Quote>,
    };

    fn from_node(node: ObjectRef, historian: &Historian) -> Result<Self, ModelError> {
        Ok(Self {
            core: ModelCore::new(Self::TYPE_INFO, node, historian)?,
        })
    }
}

#[derive(Debug)]
struct Frame {
    core: ModelCore,
    inner: MorphOne,
}
impl_model!(Frame, core);

impl ModelType for Frame {
    const TYPE_INFO: &'static TypeInfo = &TypeInfo {
        tag: "frame",
        lineage: &[],
        contract: &[],
        construct: construct::<Frame>,
    };

    fn from_node(node: ObjectRef, historian: &Historian) -> Result<Self, ModelError> {
        let core = ModelCore::new(Self::TYPE_INFO, node, historian)?;
        let inner = MorphOne::morph_one(
            core.data(),
            RelationOptions::new("inner"),
            Morph::new(TypeConstraint::Any),
        )?;
        Ok(Self { core, inner })
    }
}

#[test]
fn default_table_lifecycle() {
    let historian = Historian::default();
    let data = json!({"inner": {"_type": "quote", "text": "Less is more"}});

    // Nothing registered yet.
    assert!(default_types().is_empty());
    let err = make_model::<Frame>(data.clone(), &historian).unwrap_err();
    assert_eq!(
        err,
        ModelError::UnknownType {
            prop: "inner".into(),
            tag: "quote".into()
        }
    );

    set_default_type_map(TypeMap::new().with::<Quote>());
    let frame = make_model::<Frame>(data.clone(), &historian).unwrap();
    let inner = frame.inner.value().unwrap().unwrap();
    assert!(inner.is::<Quote>());
    assert_eq!(resolve_type(&TypeMap::new(), "quote").map(|info| info.tag), Some("quote"));

    // Last writer wins: the table is replaced, not merged.
    set_default_type_map(TypeMap::new().with::<Frame>());
    assert!(resolve_type(&TypeMap::new(), "quote").is_none());
    assert!(default_types().contains("frame"));
    assert!(make_model::<Frame>(data, &historian).is_err());
}
