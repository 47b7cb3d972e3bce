//! # sitescore-types
//!
//! Input data types for the sitescore facility-siting engine.
//!
//! - **Demand**: `DemandSegment` and its `SegmentGeometry` (point or line)
//! - **Supply**: `ExistingFacility`
//! - **Extents**: `BoundingBox2D`
//!
//! All coordinates are planar and distance-true (a local projected system in
//! meters). Conversion from longitude/latitude happens before data reaches
//! these types.
//!
//! ## Examples
//!
//! ```rust
//! use sitescore_types::segment::DemandSegment;
//! use geo::{LineString, Point};
//!
//! let street = DemandSegment::line(
//!     LineString::from(vec![(0.0, 0.0), (120.0, 0.0)]),
//!     300.0,
//!     120.0,
//! );
//! assert_eq!(street.total_traffic(), 420.0);
//!
//! let kiosk = DemandSegment::point(Point::new(10.0, 10.0), 50.0, 0.0);
//! assert_eq!(kiosk.segment_length(), 0.0);
//! ```

pub mod bbox;
pub mod facility;
pub mod segment;

pub use bbox::BoundingBox2D;
pub use facility::ExistingFacility;
pub use segment::{DemandSegment, SegmentGeometry};
