pub(crate) mod christofides;
pub(crate) mod matching;
pub(crate) mod nearest_neighbor;
pub(crate) mod short_tour;
