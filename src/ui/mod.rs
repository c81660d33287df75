pub mod app;
pub mod chart;
pub mod query;

/// Dashboard pages, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Overview,
    SectorIndices,
    Settings,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Overview, Page::SectorIndices, Page::Settings];

    pub fn title(&self) -> &'static str {
        match self {
            Page::Overview => "Overview",
            Page::SectorIndices => "Sector Indices",
            Page::Settings => "Settings",
        }
    }
}
