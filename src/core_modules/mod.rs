// THEORY:
// The core of the benchmark, leaf to root:
//
//   pixel / chunk        raw samples and the central patch container
//   patch_sampler        image -> one averaged `ColorSample`
//   color_hasher         `ColorSample` -> `ClusterKey`
//   cluster_builder      training samples -> key -> identifiers
//   label_vector         the fixed-length 37-class answer and the training table
//   label_aggregator     clusters + labels -> key -> averaged vector
//   prediction_assigner  test samples -> identifier -> vector (zero on a miss)
//
// Nothing in here touches the filesystem; decoding and tables live in `utils`.

pub mod chunk;
pub mod cluster_builder;
pub mod color_hasher;
pub mod label_aggregator;
pub mod label_vector;
pub mod patch_sampler;
pub mod pixel;
pub mod prediction_assigner;
