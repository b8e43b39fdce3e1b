// Packed CaloTower word layout (LSB first):
// [0..8]   hwPt      9 bits
// [9..11]  ehrBits   3 bits
// [12..15] miscBits  4 bits
// [16..23] hwPhi     8 bits
// [24..31] hwEta     8 bits, twos complement
//
// Values wider than their field are masked, never rejected. Losing the high bits of an
// out-of-range value is accepted behavior of the format.

const PT_SHIFT: u32 = 0;
const PT_MASK: u32 = 0x0000_01ff;
const EHR_SHIFT: u32 = 9;
const EHR_MASK: u32 = 0x0000_0e00;
const MISC_SHIFT: u32 = 12;
const MISC_MASK: u32 = 0x0000_f000;
const PHI_SHIFT: u32 = 16;
const PHI_MASK: u32 = 0x00ff_0000;
const ETA_SHIFT: u32 = 24;
const ETA_MASK: u32 = 0xff00_0000;
const ETA_BITS: u32 = 8;

/// Convert a (possibly negative) value to its n-bit twos complement representation.
///
/// Non-negative values are returned unchanged; a negative value `n` becomes `2^n_bits + n`.
/// Widths above 32 bits give the same result as 32 once truncated to a u32.
pub fn twos_complement(value: i32, n_bits: u32) -> u32 {
    let n_bits = n_bits.min(u32::BITS);
    if value < 0 {
        ((1i64 << n_bits) + value as i64) as u32
    } else {
        value as u32
    }
}

/// One calorimeter trigger tower measurement, in hardware units.
///
/// Fields are kept as plain integers as they come from the event table. When decoded
/// from a [TowerWord], `hw_eta` holds the raw unsigned byte (0..=255), not the signed value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaloTower {
    pub hw_pt: i32,
    pub hw_eta: i32,
    pub hw_phi: i32,
    pub misc_bits: i32,
    pub ehr_bits: i32,
}

impl CaloTower {
    pub fn new(hw_pt: i32, hw_eta: i32, hw_phi: i32, misc_bits: i32, ehr_bits: i32) -> Self {
        Self {
            hw_pt,
            hw_eta,
            hw_phi,
            misc_bits,
            ehr_bits,
        }
    }

    /// Pack the tower into a 32-bit word. Total: every field is masked to its width.
    pub fn encode(&self) -> TowerWord {
        let mut word: u32 = 0;
        word |= ((self.hw_pt as u32) << PT_SHIFT) & PT_MASK;
        word |= ((self.ehr_bits as u32) << EHR_SHIFT) & EHR_MASK;
        word |= ((self.misc_bits as u32) << MISC_SHIFT) & MISC_MASK;
        word |= ((self.hw_phi as u32) << PHI_SHIFT) & PHI_MASK;
        word |= (twos_complement(self.hw_eta, ETA_BITS) << ETA_SHIFT) & ETA_MASK;
        TowerWord(word)
    }
}

/// A packed CaloTower as it is written into a BX record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TowerWord(pub u32);

impl TowerWord {
    pub fn hw_pt(&self) -> u32 {
        (self.0 & PT_MASK) >> PT_SHIFT
    }

    pub fn ehr_bits(&self) -> u32 {
        (self.0 & EHR_MASK) >> EHR_SHIFT
    }

    pub fn misc_bits(&self) -> u32 {
        (self.0 & MISC_MASK) >> MISC_SHIFT
    }

    pub fn hw_phi(&self) -> u32 {
        (self.0 & PHI_MASK) >> PHI_SHIFT
    }

    /// The raw eta byte, with no sign interpretation
    pub fn hw_eta_raw(&self) -> u8 {
        ((self.0 & ETA_MASK) >> ETA_SHIFT) as u8
    }

    /// Signed interpretation of the eta byte. Only used to verify round trips;
    /// production unpacking leaves the sign to the consumer.
    pub fn hw_eta_signed(&self) -> i32 {
        self.hw_eta_raw() as i8 as i32
    }

    /// Unpack the word. `hw_eta` of the returned tower is the raw unsigned byte.
    pub fn decode(self) -> CaloTower {
        CaloTower {
            hw_pt: self.hw_pt() as i32,
            hw_eta: self.hw_eta_raw() as i32,
            hw_phi: self.hw_phi() as i32,
            misc_bits: self.misc_bits() as i32,
            ehr_bits: self.ehr_bits() as i32,
        }
    }
}

impl From<u32> for TowerWord {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<TowerWord> for u32 {
    fn from(value: TowerWord) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_word() {
        let tower = CaloTower::new(10, -1, 2, 5, 1);
        assert_eq!(tower.encode(), TowerWord(0xFF02_500A));
    }

    #[test]
    fn test_negative_eta_byte() {
        let word = CaloTower::new(0, -3, 0, 0, 0).encode();
        assert_eq!(word.hw_eta_raw(), 0xFD);
        assert_eq!(word.hw_eta_signed(), -3);
        assert_eq!(word.0 & 0x00ff_ffff, 0);
    }

    #[test]
    fn test_twos_complement() {
        assert_eq!(twos_complement(-1, 8), 255);
        assert_eq!(twos_complement(-128, 8), 128);
        assert_eq!(twos_complement(127, 8), 127);
        assert_eq!(twos_complement(0, 8), 0);
        assert_eq!(twos_complement(-1, 32), u32::MAX);
        assert_eq!(twos_complement(-1, 64), u32::MAX);
        assert_eq!(twos_complement(-5, 200), u32::MAX - 4);
    }

    #[test]
    fn test_round_trip_full_range() {
        for hw_pt in (0..=511).step_by(7) {
            for hw_eta in -128i32..=127 {
                for hw_phi in (0..=255).step_by(17) {
                    let misc_bits = (hw_pt + hw_phi) % 16;
                    let ehr_bits = hw_eta.rem_euclid(8);
                    let tower = CaloTower::new(hw_pt, hw_eta, hw_phi, misc_bits, ehr_bits);
                    let word = tower.encode();
                    let decoded = word.decode();
                    assert_eq!(decoded.hw_pt, hw_pt);
                    assert_eq!(decoded.hw_phi, hw_phi);
                    assert_eq!(decoded.misc_bits, misc_bits);
                    assert_eq!(decoded.ehr_bits, ehr_bits);
                    assert_eq!(decoded.hw_eta, hw_eta.rem_euclid(256));
                    assert_eq!(word.hw_eta_signed(), hw_eta);
                }
            }
        }
    }

    #[test]
    fn test_field_boundaries() {
        assert_eq!(CaloTower::new(511, 0, 0, 0, 0).encode().0, 0x0000_01ff);
        assert_eq!(CaloTower::new(0, 0, 0, 0, 7).encode().0, 0x0000_0e00);
        assert_eq!(CaloTower::new(0, 0, 0, 15, 0).encode().0, 0x0000_f000);
        assert_eq!(CaloTower::new(0, 0, 255, 0, 0).encode().0, 0x00ff_0000);
        assert_eq!(CaloTower::new(0, 127, 0, 0, 0).encode().0, 0x7f00_0000);
        assert_eq!(CaloTower::new(0, -128, 0, 0, 0).encode().0, 0x8000_0000);
    }

    #[test]
    fn test_out_of_range_is_masked() {
        let base = CaloTower::new(100, -20, 30, 3, 2);
        let cases = [
            (CaloTower { hw_pt: 100 + 512 * 3, ..base }, "hw_pt"),
            (CaloTower { hw_pt: 100 - 512, ..base }, "hw_pt negative"),
            (CaloTower { ehr_bits: 2 + 8, ..base }, "ehr_bits"),
            (CaloTower { misc_bits: 3 + 16 * 5, ..base }, "misc_bits"),
            (CaloTower { hw_phi: 30 + 256, ..base }, "hw_phi"),
            (CaloTower { hw_eta: -20 - 256, ..base }, "hw_eta low"),
            (CaloTower { hw_eta: 236, ..base }, "hw_eta unsigned alias"),
        ];
        for (tower, name) in cases {
            assert_eq!(tower.encode(), base.encode(), "masking failed for {name}");
        }
    }

    #[test]
    fn test_masking_never_spills() {
        let word = CaloTower::new(-1, 0, 0, 0, 0).encode();
        assert_eq!(word.0, PT_MASK);
        let word = CaloTower::new(0, 0, -1, 0, 0).encode();
        assert_eq!(word.0, PHI_MASK);
    }
}
