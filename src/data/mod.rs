pub mod roster;
pub mod validate;

pub use roster::{
    find_unit, load_roster, normalize_lookup, parse_roster, RosterFormat, DEFAULT_ROSTER_PATH,
};
pub use validate::{
    validate_roster_file, validate_roster_value, ValidationDiagnostic, ValidationReport,
    ValidationSeverity,
};
