//! Detection and loading of hidden volumes inside a series
//!
//! A series whose indicator tags (acquisition number, image type,
//! orientation, diffusion direction) vary holds several volumes. The
//! [`SubseriesResolver`] reports each varying tag as an axis; the
//! [`SeriesLoader`] refuses to stack such a series into one volume.

mod loader;
mod resolver;
mod sorter;

pub use loader::{SeriesLoader, SpatialSorter, VolumeLoader};
pub use resolver::{series_ids, Subseries, SubseriesResolver};
pub use sorter::IppSorter;
