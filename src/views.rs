use std::fmt;

/// A rendered view whose cached copy goes stale after a mutation.
///
/// Mutations report the views they touched; the caller decides how to
/// refresh them. The CLI only logs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Dashboard,
    Contacts,
    Contact(i64),
    Leads,
    Lead(i64),
    Pipelines,
    Pipeline(i64),
    Tasks,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Dashboard => write!(f, "/dashboard"),
            View::Contacts => write!(f, "/contacts"),
            View::Contact(id) => write!(f, "/contacts/{}", id),
            View::Leads => write!(f, "/leads"),
            View::Lead(id) => write!(f, "/leads/{}", id),
            View::Pipelines => write!(f, "/pipelines"),
            View::Pipeline(id) => write!(f, "/pipelines/{}", id),
            View::Tasks => write!(f, "/tasks"),
        }
    }
}

/// Build a de-duplicated view list, preserving first-seen order
pub fn collect<I: IntoIterator<Item = View>>(views: I) -> Vec<View> {
    let mut out: Vec<View> = Vec::new();
    for view in views {
        if !out.contains(&view) {
            out.push(view);
        }
    }
    out
}

/// Emit invalidation signals for `views`
pub fn invalidate(views: &[View]) {
    for view in views {
        log::debug!("invalidate {}", view);
    }
}
