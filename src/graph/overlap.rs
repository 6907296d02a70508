//! GFA2 overlap geometry for one edge.
//!
//! An edge joins two oriented segments over an overlap that must sit at
//! an end of each. Along the oriented vertex the overlap splits it into a
//! part upstream (`l1`) and a part downstream (`r2`):
//!
//! ```text
//!      |<--- l1 --->|<-- o -->|<- r2 ->|
//!   v: -------------==========---------
//!      |<-------- l2 -------->|
//!                   |<------ r1 ------>|
//! ```
//!
//! An accepted edge has exactly one of `l1`, `r2` non-zero on each side.
//! The side with sequence upstream of the overlap is `v`, the one with
//! sequence downstream is `w`; when the caller's source turns out to be
//! downstream the two are swapped.

use smallvec::{smallvec, SmallVec};

use crate::error::{GfaError, Result};

use super::{Arc, Loc, VertexId};

/// One side of an edge: an oriented segment and its overlap interval in
/// forward coordinates.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Side<'a> {
    pub(crate) reference: &'a str,
    pub(crate) seg: usize,
    pub(crate) len: u32,
    pub(crate) beg: u32,
    pub(crate) end: u32,
    pub(crate) neg: bool,
}

impl<'a> Side<'a> {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.len == 0 {
            return Err(GfaError::invalid_overlap(self.reference, "segment length is 0"));
        }
        if self.beg > self.len || self.end > self.len {
            return Err(GfaError::invalid_overlap(
                self.reference,
                "begin or end beyond segment length",
            ));
        }
        if self.beg > self.end {
            return Err(GfaError::invalid_overlap(self.reference, "begin past end"));
        }
        match (self.l1() > 0, self.r2() > 0) {
            (true, true) => Err(GfaError::invalid_overlap(
                self.reference,
                "overlap lies in the interior of the segment",
            )),
            (false, false) => Err(GfaError::invalid_overlap(
                self.reference,
                "overlap contains the whole segment",
            )),
            _ => Ok(()),
        }
    }

    pub(crate) fn vertex(&self) -> VertexId {
        VertexId::new(self.seg, self.neg)
    }

    pub(crate) fn o(&self) -> u32 {
        self.end - self.beg
    }

    pub(crate) fn l1(&self) -> u32 {
        if self.neg {
            self.len - self.end
        } else {
            self.beg
        }
    }

    pub(crate) fn l2(&self) -> u32 {
        if self.neg {
            self.len - self.beg
        } else {
            self.end
        }
    }

    pub(crate) fn r1(&self) -> u32 {
        if self.neg {
            self.end
        } else {
            self.len - self.beg
        }
    }

    pub(crate) fn r2(&self) -> u32 {
        if self.neg {
            self.beg
        } else {
            self.len - self.end
        }
    }

    // On the inverse vertex upstream and downstream swap.

    pub(crate) fn l1i(&self) -> u32 {
        self.r2()
    }

    pub(crate) fn l2i(&self) -> u32 {
        self.r1()
    }

    fn goes_left(&self) -> bool {
        self.l1() > 0
    }

    fn goes_right(&self) -> bool {
        self.r2() > 0
    }
}

/// A validated edge with its sides in canonical upstream/downstream order.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Overlap<'a> {
    pub(crate) v: Side<'a>,
    pub(crate) w: Side<'a>,
}

impl<'a> Overlap<'a> {
    /// Validates both sides and orders them so that `v` feeds into `w`.
    pub(crate) fn new(src: Side<'a>, dst: Side<'a>) -> Result<Self> {
        src.validate()?;
        dst.validate()?;
        if Self::needs_flip(&src, &dst)? {
            Ok(Self { v: dst, w: src })
        } else {
            Ok(Self { v: src, w: dst })
        }
    }

    fn needs_flip(src: &Side<'_>, dst: &Side<'_>) -> Result<bool> {
        if src.goes_left() && dst.goes_right() {
            return Ok(false);
        }
        if src.goes_right() && dst.goes_left() {
            return Ok(true);
        }
        Err(GfaError::ImpossibleEdge {
            src: src.reference.to_string(),
            dst: dst.reference.to_string(),
        })
    }

    pub(crate) fn ov(&self) -> u32 {
        self.v.o()
    }

    pub(crate) fn ow(&self) -> u32 {
        self.w.o()
    }

    /// Arcs encoding this edge.
    ///
    /// At the start of the overlap: `v:lv → w:lw` and its complement
    /// `w':lw' → v':lv'`. When the overlap is non-empty the same pair is
    /// repeated at the far end of the overlap. The reverse arcs
    /// (`w:lw → v:lv` and friends) would depart at offset 0 or land at the
    /// very end of a vertex, so they only ever serve as transit between
    /// other edges and are left out.
    pub(crate) fn arcs(&self) -> SmallVec<[Arc; 4]> {
        let (v, w) = (self.v.vertex(), self.w.vertex());
        let (vi, wi) = (v.inverse(), w.inverse());

        let mut arcs: SmallVec<[Arc; 4]> = smallvec![
            Arc::new(Loc::new(v, self.v.l1()), Loc::new(w, self.w.l1())),
            Arc::new(Loc::new(wi, self.w.l1i()), Loc::new(vi, self.v.l1i())),
        ];

        if self.ov() != 0 || self.ow() != 0 {
            arcs.push(Arc::new(
                Loc::new(v, self.v.l2()),
                Loc::new(w, self.w.l2()),
            ));
            arcs.push(Arc::new(
                Loc::new(wi, self.w.l2i()),
                Loc::new(vi, self.v.l2i()),
            ));
        }

        arcs
    }
}
