//! Definite-initialization state.
//!
//! Each place carries an [`InitNode`]: uninitialized, initialized, or
//! partially initialized with one child per struct field. Branch states
//! are combined with a meet, so a place is initialized after a join only
//! if it is initialized on every incoming path.
//!
//! Writes through a dereference initialize nothing the analysis tracks.
//! Writes to an array element count as a write of the whole array, and
//! element reads are not checked.

use rustc_hash::FxHashMap;

use regal_ir::{Module, Name, PlaceId, PlaceKind, PlacePath, Projection, Type};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InitNode {
    Uninit,
    Init,
    /// Some fields written; one entry per field of the struct.
    Partial(Vec<(Name, InitNode)>),
}

impl InitNode {
    /// Must-initialize combination of two paths.
    pub fn meet(&self, other: &InitNode) -> InitNode {
        match (self, other) {
            (InitNode::Init, x) | (x, InitNode::Init) => x.clone(),
            (InitNode::Uninit, _) | (_, InitNode::Uninit) => InitNode::Uninit,
            (InitNode::Partial(a), InitNode::Partial(b)) => {
                let fields = a
                    .iter()
                    .map(|(name, ca)| {
                        let child = b
                            .iter()
                            .find(|(n, _)| n == name)
                            .map_or(InitNode::Uninit, |(_, cb)| ca.meet(cb));
                        (*name, child)
                    })
                    .collect();
                InitNode::Partial(fields).normalized()
            }
        }
    }

    fn normalized(self) -> InitNode {
        match self {
            InitNode::Partial(fields) if fields.iter().all(|(_, c)| *c == InitNode::Init) => {
                InitNode::Init
            }
            InitNode::Partial(fields) if fields.iter().all(|(_, c)| *c == InitNode::Uninit) => {
                InitNode::Uninit
            }
            other => other,
        }
    }

    /// Whether reading `projections` below this node sees initialized data.
    fn readable(&self, projections: &[Projection]) -> bool {
        match (projections.first(), self) {
            (None, node) => *node == InitNode::Init,
            (Some(_), InitNode::Init) => true,
            (Some(Projection::Index(_)), _) => true,
            (Some(Projection::Deref), node) => *node == InitNode::Init,
            (Some(Projection::Field(_)), InitNode::Uninit) => false,
            (Some(Projection::Field(f)), InitNode::Partial(fields)) => fields
                .iter()
                .find(|(n, _)| n == f)
                .is_none_or(|(_, child)| child.readable(&projections[1..])),
        }
    }

    fn write(&mut self, ty: &Type, projections: &[Projection], module: &Module) {
        match projections.first() {
            None | Some(Projection::Index(_)) => *self = InitNode::Init,
            Some(Projection::Deref) => {}
            Some(Projection::Field(f)) => {
                if *self == InitNode::Init {
                    return;
                }
                let Type::Struct(id) = ty else {
                    *self = InitNode::Init;
                    return;
                };
                let Some(def) = module.struct_def(*id) else {
                    *self = InitNode::Init;
                    return;
                };
                if *self == InitNode::Uninit {
                    *self = InitNode::Partial(
                        def.fields
                            .iter()
                            .map(|field| (field.name, InitNode::Uninit))
                            .collect(),
                    );
                }
                if let InitNode::Partial(fields) = self {
                    if let (Some((_, child)), Some(field)) = (
                        fields.iter_mut().find(|(n, _)| n == f),
                        def.fields.iter().find(|field| field.name == *f),
                    ) {
                        child.write(&field.ty, &projections[1..], module);
                    }
                }
                *self = std::mem::replace(self, InitNode::Uninit).normalized();
            }
        }
    }
}

/// Initialization of every place on one control-flow path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InitState {
    places: FxHashMap<PlaceId, InitNode>,
}

impl InitState {
    /// State of a place not (yet) written on this path.
    fn default_node(module: &Module, place: PlaceId) -> InitNode {
        match module.place(place).map(|p| p.kind) {
            Some(PlaceKind::Local) => InitNode::Uninit,
            Some(PlaceKind::Param | PlaceKind::Global) | None => InitNode::Init,
        }
    }

    pub fn node(&self, module: &Module, place: PlaceId) -> InitNode {
        self.places
            .get(&place)
            .cloned()
            .unwrap_or_else(|| Self::default_node(module, place))
    }

    /// `Let` of a local, with or without initializer.
    pub fn declare(&mut self, place: PlaceId, initialized: bool) {
        let node = if initialized {
            InitNode::Init
        } else {
            InitNode::Uninit
        };
        self.places.insert(place, node);
    }

    /// Whether `path` can be read on this path.
    pub fn is_readable(&self, module: &Module, path: &PlacePath) -> bool {
        match self.places.get(&path.root) {
            Some(node) => node.readable(&path.projections),
            None => Self::default_node(module, path.root).readable(&path.projections),
        }
    }

    /// Record a write to `path`.
    pub fn write(&mut self, module: &Module, path: &PlacePath) {
        let Some(decl) = module.place(path.root) else {
            return;
        };
        let node = self
            .places
            .entry(path.root)
            .or_insert_with(|| Self::default_node(module, path.root));
        node.write(&decl.ty, &path.projections, module);
    }

    pub fn forget(&mut self, place: PlaceId) {
        self.places.remove(&place);
    }

    /// Meet of two paths.
    pub fn join(&self, other: &InitState, module: &Module) -> InitState {
        let mut places = FxHashMap::default();
        for place in self.places.keys().chain(other.places.keys()) {
            if places.contains_key(place) {
                continue;
            }
            let node = self.node(module, *place).meet(&other.node(module, *place));
            places.insert(*place, node);
        }
        InitState { places }
    }
}
