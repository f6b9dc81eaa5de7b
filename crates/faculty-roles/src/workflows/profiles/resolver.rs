use std::sync::Arc;

use super::domain::{ProfileDraft, RespondentProfile};
use super::inference::default_name;
use super::sources::{ProfileSource, SourceAuthority};
use crate::events::{DashboardEvent, EventSink};

/// Resolves a respondent profile from an ordered list of sources.
///
/// The profile starts with a name derived from the email. Sources are tried
/// in order; an authoritative hit replaces what it carries and stops the walk
/// even when it carries nothing, a supplementary hit only fills empty fields. A failing source contributes
/// nothing and the walk continues.
#[derive(Debug, Clone)]
pub struct ProfileResolver {
    sources: Vec<Arc<dyn ProfileSource>>,
    events: Arc<dyn EventSink>,
}

impl ProfileResolver {
    pub fn new(events: Arc<dyn EventSink>) -> Self {
        Self {
            sources: Vec::new(),
            events,
        }
    }

    pub fn with_source<S>(mut self, source: S) -> Self
    where
        S: ProfileSource + 'static,
    {
        self.sources.push(Arc::new(source));
        self
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|source| source.name()).collect()
    }

    pub fn resolve(&self, email: &str) -> RespondentProfile {
        let mut draft = ProfileDraft::new(email, default_name(email));
        let mut contributors = Vec::new();

        for source in &self.sources {
            if draft.is_complete() {
                break;
            }

            let fragment = match source.lookup(email) {
                Ok(Some(fragment)) => fragment.normalized(),
                Ok(None) => continue,
                Err(err) => {
                    self.events.emit(DashboardEvent::ProfileSourceFailed {
                        source: source.name(),
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            let authority = source.authority();
            if fragment.is_empty() && authority == SourceAuthority::Supplementary {
                continue;
            }
            contributors.push(source.name());

            match authority {
                SourceAuthority::Authoritative => {
                    draft.overwrite_with(fragment);
                    break;
                }
                SourceAuthority::Supplementary => draft.fill_empty(fragment),
            }
        }

        self.events.emit(DashboardEvent::ProfileResolved {
            email: email.to_string(),
            sources: contributors,
        });

        draft.into_profile()
    }
}
