use crate::query::BinaryOp;
use crate::DocId;
use bit_vec::BitVec;

/// Dense membership vector over all document ids, used while evaluating a
/// boolean expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    bits: BitVec,
}

impl Bitmap {
    pub fn empty(num_docs: usize) -> Self {
        Self { bits: BitVec::from_elem(num_docs, false) }
    }

    /// Ids outside `0..num_docs` are ignored.
    pub fn from_postings(postings: &[DocId], num_docs: usize) -> Self {
        let mut bitmap = Self::empty(num_docs);
        for &id in postings {
            if (id as usize) < num_docs {
                bitmap.bits.set(id as usize, true);
            }
        }
        bitmap
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn and(&mut self, other: &Bitmap) {
        self.bits.and(&other.bits);
    }

    pub fn or(&mut self, other: &Bitmap) {
        self.bits.or(&other.bits);
    }

    pub fn negate(&mut self) {
        self.bits.negate();
    }

    pub fn combine(&mut self, op: BinaryOp, other: &Bitmap) {
        match op {
            BinaryOp::And => self.and(other),
            BinaryOp::Or => self.or(other),
        }
    }

    pub fn count_ones(&self) -> usize {
        self.bits.iter().filter(|b| *b).count()
    }

    pub fn to_doc_ids(&self) -> Vec<DocId> {
        self.bits.iter().enumerate().filter(|(_, b)| *b).map(|(i, _)| i as DocId).collect()
    }
}
