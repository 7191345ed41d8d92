use serde::Serialize;
use std::fmt;

/// What one resume pass did for a site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Items imported from a legacy topic file.
    pub seeded: usize,
    /// New items appended from topic proposal.
    pub proposed: usize,
    pub guidelines: usize,
    pub articles: usize,
    /// Image stages closed, including ones that produced no images.
    pub images: usize,
    /// Stage attempts that left their flag unset, plus failed proposals.
    pub failures: usize,
    pub total: usize,
    pub incomplete: usize,
}

impl RunReport {
    pub fn made_progress(&self) -> bool {
        self.seeded + self.proposed + self.guidelines + self.articles + self.images > 0
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} topics tracked ({} incomplete); this run: {} guidelines, {} articles, {} image sets, {} new topics",
            self.total, self.incomplete, self.guidelines, self.articles, self.images, self.proposed
        )?;
        if self.seeded > 0 {
            write!(f, ", {} seeded from legacy topics", self.seeded)?;
        }
        if self.failures > 0 {
            write!(f, ", {} failed stages", self.failures)?;
        }
        Ok(())
    }
}
