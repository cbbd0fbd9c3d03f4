#![forbid(unsafe_code)]

//! Property tests for list relations under arbitrary edit/undo/redo runs.
//!
//! Validates:
//! - The relation value always lists the nodes of the backing array, in order.
//! - A child seen once is the same instance whenever its node is a member.
//! - Undoing everything restores the data as built.

use std::rc::Rc;

use proptest::prelude::*;
use serde_json::json;

use pagecraft_history::{ArrayRef, Historian, HistoryConfig, ObjectRef, ValueKind};
use pagecraft_model::{
    FieldSpec, HasMany, Model, ModelCore, ModelError, ModelType, Relation, RelationOptions,
    TypeInfo, construct, impl_model, make_model,
};

// ============================================================================
// Models
// ============================================================================

#[derive(Debug)]
struct Track {
    core: ModelCore,
}
impl_model!(Track, core);

impl ModelType for Track {
    const TYPE_INFO: &'static TypeInfo = &TypeInfo {
        tag: "track",
        lineage: &[],
        contract: &[FieldSpec::required("title", ValueKind::String)],
        construct: construct::<Track>,
    };

    fn from_node(node: ObjectRef, historian: &Historian) -> Result<Self, ModelError> {
        Ok(Self {
            core: ModelCore::new(Self::TYPE_INFO, node, historian)?,
        })
    }
}

#[derive(Debug)]
struct Playlist {
    core: ModelCore,
    tracks: HasMany<Track>,
}
impl_model!(Playlist, core);

impl ModelType for Playlist {
    const TYPE_INFO: &'static TypeInfo = &TypeInfo {
        tag: "playlist",
        lineage: &[],
        contract: &[],
        construct: construct::<Playlist>,
    };

    fn from_node(node: ObjectRef, historian: &Historian) -> Result<Self, ModelError> {
        let core = ModelCore::new(Self::TYPE_INFO, node, historian)?;
        let tracks = HasMany::has_many(core.data(), RelationOptions::new("tracks"))?;
        Ok(Self { core, tracks })
    }
}

// ============================================================================
// Strategy helpers
// ============================================================================

#[derive(Debug, Clone)]
enum Op {
    Push,
    Remove(u8),
    Reverse,
    Undo,
    Redo,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Push),
        2 => any::<u8>().prop_map(Op::Remove),
        1 => Just(Op::Reverse),
        2 => Just(Op::Undo),
        1 => Just(Op::Redo),
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn list_relation_mirrors_data_and_keeps_identity(
        ops in prop::collection::vec(op_strategy(), 1..40),
    ) {
        let historian = Historian::new(HistoryConfig::new(128));
        let playlist = make_model::<Playlist>(
            json!({"tracks": [{"title": "t0"}, {"title": "t1"}]}),
            &historian,
        )
        .unwrap();
        let initial = playlist.get_data();
        let mut seen: Vec<Rc<Track>> = playlist.tracks.value().unwrap();

        for (step, op) in ops.into_iter().enumerate() {
            match op {
                Op::Push => {
                    let track: Track =
                        playlist.make_model(json!({"title": format!("new{step}")})).unwrap();
                    let track = Rc::new(track);
                    playlist.tracks.push(track.clone()).unwrap();
                    seen.push(track);
                }
                Op::Remove(pick) => {
                    let members = playlist.tracks.value().unwrap();
                    if !members.is_empty() {
                        let victim = &members[pick as usize % members.len()];
                        prop_assert!(playlist.tracks.remove(victim));
                    }
                }
                Op::Reverse => {
                    let mut members = playlist.tracks.value().unwrap();
                    members.reverse();
                    playlist.tracks.set_value(members).unwrap();
                }
                Op::Undo => {
                    historian.undo();
                }
                Op::Redo => {
                    historian.redo();
                }
            }

            let members = playlist.tracks.value().unwrap();
            let raw = playlist
                .get_prop("tracks")
                .and_then(|value| value.as_array().map(ArrayRef::to_vec))
                .unwrap_or_default();
            prop_assert_eq!(members.len(), raw.len());
            for (member, node) in members.iter().zip(&raw) {
                prop_assert!(node.as_object().is_some_and(|node| node.ptr_eq(member.node())));
                if let Some(earlier) = seen.iter().find(|s| s.node().ptr_eq(member.node())) {
                    prop_assert!(Rc::ptr_eq(earlier, member));
                }
            }
        }

        while historian.undo() {}
        prop_assert_eq!(playlist.get_data(), initial);
    }
}
