//! Partitioning of a project's modules into worker-sized chunks

use crate::model::{Module, Project};

/// Chunks per worker; over-partitioning evens out uneven module sizes
pub const OVER_PARTITION: usize = 4;

/// A contiguous group of whole modules handed to one worker task
pub type Chunk = Vec<(String, Module)>;

/// `ceil(modules / (workers * 4))`, never less than 1
pub fn chunk_size(modules: usize, workers: usize) -> usize {
    let slots = workers.max(1) * OVER_PARTITION;
    modules.div_ceil(slots).max(1)
}

/// Split the project's modules, in their stored order, into owned chunks
pub fn partition(project: &Project, workers: usize) -> Vec<Chunk> {
    let size = chunk_size(project.modules.len(), workers);
    let modules: Vec<(String, Module)> = project
        .modules
        .iter()
        .map(|(path, module)| (path.clone(), module.clone()))
        .collect();
    modules.chunks(size).map(<[_]>::to_vec).collect()
}
