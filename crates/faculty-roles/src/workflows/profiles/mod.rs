//! Respondent profile resolution for pre-filling the interest form.

mod domain;
mod inference;
mod resolver;
mod sources;

pub use domain::{ProfileFragment, RespondentProfile};
pub use inference::{default_name, infer_department, local_part};
pub use resolver::ProfileResolver;
pub use sources::{
    DirectoryError, DirectoryLookup, DirectorySheetSource, DirectorySource, EmailPatternSource,
    ProfileSource, ProfileSourceError, ProfileTableError, SourceAuthority, StaticDirectory,
    StaticProfileTable,
};
