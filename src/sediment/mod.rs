//! Bed material and bedload transport.
//!
//! - Granulometry: grain-size descriptors shared by sections
//! - Transport laws: eight empirical formulas for steep channels

mod granulometry;
mod transport;

pub use granulometry::{Granulometry, GranulometryError};
pub use transport::{
    Lefort2015, LefortSogreah1991, Meunier1989, MeyerPeter1948, Piton2016, PitonRecking2017,
    Rickenmann1990, Rickenmann1991, TransportLaw, TransportLawKind, UnknownTransportLaw,
    uniform_flow_depth,
};
