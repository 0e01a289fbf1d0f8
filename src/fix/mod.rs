//! TS1016 repair: parameter sequence repair, declaration walking and the
//! batch driver that ties them to a project.

pub mod engine;
pub mod output;
pub mod params;
pub mod walker;

pub use engine::{FixEngine, FixOptions, FixSummary};
pub use params::{has_ordering_violation, is_optional, repair_parameters, ParamNode, Parameter};
pub use walker::{
    collect_function_likes, fix_unit, DeclarationKind, FixRecord, FunctionLike, UnitReport,
};
