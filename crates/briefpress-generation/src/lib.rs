// SPDX-License-Identifier: GPL-3.0-or-later
//! HTTP clients for the pipeline's external collaborators: the research
//! scraper, the content writer, and the image studio. The pipeline only
//! depends on their request/response contracts, modeled here.

pub mod error;
pub mod images;
pub mod scraper;
pub mod writer;

pub use error::{GenerationError, Result};
pub use images::{GeneratedImage, ImageStudio};
pub use scraper::{HarvestedSource, ResearchScraper};
pub use writer::{ContentWriter, DraftRequest, DraftResponse};
