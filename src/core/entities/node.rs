use std::sync::Arc;

use crate::core::dataset::DataSet;
use crate::core::list::{IntegerList, VariableEntityFactory};
use crate::error::{Result, ResultExt};
use crate::storage::format::{
    NodeFormat, NodeHeader, NodeIndex, NodeNumericIndex, NodeRecord, RankedBlock,
};
use crate::storage::pool::Pool;
use crate::storage::reader::Reader;

use super::{to_key, AsciiString, LazyField, Signature};

/// Shared state needed to build nodes and resolve their lazy fields
#[derive(Debug)]
pub struct NodeContext {
    pool: Arc<Pool>,
    format: Arc<dyn NodeFormat>,
    /// V32 ranked signature blocks point into this list
    ranked_indexes: Arc<IntegerList>,
}

impl NodeContext {
    pub fn new(
        pool: Arc<Pool>,
        format: Arc<dyn NodeFormat>,
        ranked_indexes: Arc<IntegerList>,
    ) -> Self {
        Self {
            pool,
            format,
            ranked_indexes,
        }
    }

    pub fn format(&self) -> &dyn NodeFormat {
        self.format.as_ref()
    }
}

#[derive(Debug)]
struct RankedSignatures {
    indexes: Box<[i32]>,
    /// V32 indirect block start, zero otherwise
    block: i32,
}

/// A node in the detection tree.
///
/// Header and character children are read when the node is created. Numeric
/// children and ranked signature indexes follow the children block and are read
/// on first access.
#[derive(Debug)]
pub struct Node {
    offset: u32,
    header: NodeHeader,
    children: Box<[NodeIndex]>,
    /// Stream position just after the children block
    numeric_position: u64,
    context: Arc<NodeContext>,
    numeric_children: LazyField<Box<[NodeNumericIndex]>>,
    ranked_signatures: LazyField<RankedSignatures>,
}

impl Node {
    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn header(&self) -> &NodeHeader {
        &self.header
    }

    pub fn position(&self) -> i16 {
        self.header.position
    }

    pub fn next_character_position(&self) -> i16 {
        self.header.next_character_position
    }

    pub fn parent_offset(&self) -> i32 {
        self.header.parent_offset
    }

    pub fn is_root(&self) -> bool {
        self.header.parent_offset < 0
    }

    pub fn character_string_offset(&self) -> i32 {
        self.header.character_string_offset
    }

    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }

    pub fn numeric_children_count(&self) -> u32 {
        self.header.numeric_children_count
    }

    pub fn ranked_signature_count(&self) -> u32 {
        self.header.ranked_signature_count
    }

    /// Bytes taken by the whole record
    pub fn length(&self) -> u64 {
        self.context.format.record_length(&self.header)
    }

    pub fn numeric_children(&self) -> Result<&[NodeNumericIndex]> {
        self.numeric_children
            .get_or_try_init(|| self.read_numeric_children())
            .map(|children| &**children)
            .context("cannot obtain numeric children")
    }

    fn read_numeric_children(&self) -> Result<Box<[NodeNumericIndex]>> {
        let count = self.header.numeric_children_count as usize;
        if count == 0 {
            return Ok(Box::default());
        }

        let mut reader = self.context.pool.acquire()?;
        reader.seek(self.numeric_position)?;
        let mut children = Vec::with_capacity(count);
        for _ in 0..count {
            children.push(NodeNumericIndex {
                value: reader.read_i16()?,
                related_node_offset: reader.read_i32()?,
            });
        }
        Ok(children.into_boxed_slice())
    }

    pub fn ranked_signature_indexes(&self) -> Result<&[i32]> {
        self.ranked_signatures
            .get_or_try_init(|| self.read_ranked_signatures())
            .map(|ranked| &*ranked.indexes)
            .context("cannot obtain ranked signature indexes")
    }

    fn read_ranked_signatures(&self) -> Result<RankedSignatures> {
        let count = self.header.ranked_signature_count;
        if count == 0 {
            return Ok(RankedSignatures {
                indexes: Box::default(),
                block: 0,
            });
        }

        let format = &self.context.format;
        let block = {
            let mut reader = self.context.pool.acquire()?;
            reader.seek(
                self.numeric_position
                    + format.ranked_block_offset(self.header.numeric_children_count),
            )?;
            format.read_ranked_block(&mut *reader, count)?
        };

        let (indexes, block) = match block {
            RankedBlock::Empty => (Vec::new(), 0),
            RankedBlock::Inline(indexes) => (indexes, 0),
            RankedBlock::Single(index) => (vec![index], 0),
            RankedBlock::Indirect { first, count } => (
                self.context.ranked_indexes.get_range(first, count)?,
                first as i32,
            ),
        };
        Ok(RankedSignatures {
            indexes: indexes.into_boxed_slice(),
            block,
        })
    }

    /// Signatures ranked against this node
    pub fn ranked_signatures(&self, dataset: &DataSet) -> Result<Vec<Arc<Signature>>> {
        self.ranked_signature_indexes()?
            .iter()
            .map(|&index| {
                let rank = dataset
                    .ranked_signature_indexes()
                    .get(to_key(index, "ranked signature index")?)?;
                dataset.signatures().get(to_key(rank, "signature index")?)
            })
            .collect()
    }

    pub fn parent(&self, dataset: &DataSet) -> Result<Option<Arc<Node>>> {
        if self.is_root() {
            return Ok(None);
        }
        dataset
            .nodes()
            .get(self.header.parent_offset as u32)
            .map(Some)
    }

    /// Characters matched by this node, if it stores any
    pub fn characters(&self, dataset: &DataSet) -> Result<Option<Arc<AsciiString>>> {
        if self.header.character_string_offset < 0 {
            return Ok(None);
        }
        dataset
            .strings()
            .get(self.header.character_string_offset as u32)
            .map(Some)
    }

    pub fn to_record(&self) -> Result<NodeRecord> {
        let numeric_children = self.numeric_children()?.to_vec();
        let ranked_signature_indexes = self.ranked_signature_indexes()?.to_vec();
        let ranked_signature_block = self
            .ranked_signatures
            .get()
            .map_or(0, |ranked| ranked.block);

        Ok(NodeRecord {
            position: self.header.position,
            next_character_position: self.header.next_character_position,
            parent_offset: self.header.parent_offset,
            character_string_offset: self.header.character_string_offset,
            children: self.children.to_vec(),
            numeric_children,
            ranked_signature_indexes,
            ranked_signature_block,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.context.format.serialize_node(&self.to_record()?))
    }

    #[cfg(test)]
    pub(crate) fn numeric_children_loaded(&self) -> bool {
        self.numeric_children.get().is_some()
    }
}

#[derive(Debug, Clone)]
pub struct NodeFactory {
    context: Arc<NodeContext>,
}

impl NodeFactory {
    pub fn new(context: Arc<NodeContext>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &Arc<NodeContext> {
        &self.context
    }
}

impl VariableEntityFactory for NodeFactory {
    type Entity = Node;

    fn create(&self, offset: u32, reader: &mut Reader) -> Result<Node> {
        let format = &self.context.format;
        let header = format
            .read_header(reader)
            .context("cannot read node header")?;

        let mut children = Vec::with_capacity(header.children_count as usize);
        for _ in 0..header.children_count {
            children.push(format.read_child(reader).context("cannot read node children")?);
        }
        let numeric_position = reader.position()?;

        Ok(Node {
            offset,
            header,
            children: children.into_boxed_slice(),
            numeric_position,
            context: Arc::clone(&self.context),
            numeric_children: LazyField::new(),
            ranked_signatures: LazyField::new(),
        })
    }

    fn length(&self, entity: &Node) -> u64 {
        entity.length()
    }
}
