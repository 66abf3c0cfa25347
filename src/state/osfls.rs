//! Binary encode/decode for `.osfls` state files.
//!
//! All values are little-endian. Layout (version 0):
//!
//! | field | type |
//! |---|---|
//! | version | `i32` |
//! | trigger time | `f64` |
//! | model | `i32` |
//! | morphable | `u8` (bool) |
//! | line count, vertex count, quantity count, name bytes | 4 × `u64` |
//! | line starts | `i32` × lines |
//! | line counts | `u32` × lines |
//! | positions | 3 × `f32` × vertices |
//! | extra quantities | `f32` × vertices, per quantity |
//! | quantity names | NUL-terminated strings, concatenated |
//!
//! Matched path lines are not part of the format.

use std::io::{Read, Write};

use glam::Vec3;

use super::{FieldlinesState, Model};
use crate::error::FieldlinesError;

/// Version written by this build. Files with any other version are
/// rejected.
pub const CURRENT_VERSION: i32 = 0;

/// File extension of binary state files.
pub const OSFLS_EXTENSION: &str = "osfls";

// ── Primitive writers ───────────────────────────────────────────

fn write_i32(w: &mut impl Write, v: i32) -> Result<(), FieldlinesError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn write_u32(w: &mut impl Write, v: u32) -> Result<(), FieldlinesError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn write_u64(w: &mut impl Write, v: u64) -> Result<(), FieldlinesError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn write_f32(w: &mut impl Write, v: f32) -> Result<(), FieldlinesError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn write_f64(w: &mut impl Write, v: f64) -> Result<(), FieldlinesError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

// ── Primitive readers ───────────────────────────────────────────

fn read_array<const N: usize>(r: &mut impl Read) -> Result<[u8; N], FieldlinesError> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            FieldlinesError::MalformedFile("file ended before all data was read".to_owned())
        } else {
            FieldlinesError::Io(e)
        }
    })?;
    Ok(buf)
}

fn read_i32(r: &mut impl Read) -> Result<i32, FieldlinesError> {
    Ok(i32::from_le_bytes(read_array(r)?))
}

fn read_u32(r: &mut impl Read) -> Result<u32, FieldlinesError> {
    Ok(u32::from_le_bytes(read_array(r)?))
}

fn read_u64(r: &mut impl Read) -> Result<u64, FieldlinesError> {
    Ok(u64::from_le_bytes(read_array(r)?))
}

fn read_f32(r: &mut impl Read) -> Result<f32, FieldlinesError> {
    Ok(f32::from_le_bytes(read_array(r)?))
}

fn read_f64(r: &mut impl Read) -> Result<f64, FieldlinesError> {
    Ok(f64::from_le_bytes(read_array(r)?))
}

fn read_len(r: &mut impl Read, what: &str) -> Result<usize, FieldlinesError> {
    let v = read_u64(r)?;
    usize::try_from(v)
        .map_err(|_| FieldlinesError::MalformedFile(format!("{what} {v} does not fit in memory")))
}

// ── State encode/decode ─────────────────────────────────────────

/// Encode `state` in the current binary layout.
pub fn write_osfls(state: &FieldlinesState, w: &mut impl Write) -> Result<(), FieldlinesError> {
    let mut names = Vec::new();
    for name in &state.extra_quantity_names {
        names.extend_from_slice(name.as_bytes());
        names.push(0);
    }

    write_i32(w, CURRENT_VERSION)?;
    write_f64(w, state.trigger_time)?;
    write_i32(w, state.model.as_i32())?;
    w.write_all(&[u8::from(state.is_morphable)])?;

    write_u64(w, state.line_start.len() as u64)?;
    write_u64(w, state.vertex_positions.len() as u64)?;
    write_u64(w, state.extra_quantities.len() as u64)?;
    write_u64(w, names.len() as u64)?;

    for &start in &state.line_start {
        write_i32(w, start as i32)?;
    }
    for &count in &state.line_count {
        write_u32(w, count)?;
    }
    for p in &state.vertex_positions {
        write_f32(w, p.x)?;
        write_f32(w, p.y)?;
        write_f32(w, p.z)?;
    }
    for quantity in &state.extra_quantities {
        if quantity.len() != state.vertex_positions.len() {
            return Err(FieldlinesError::InconsistentState(format!(
                "extra quantity has {} values for {} vertices",
                quantity.len(),
                state.vertex_positions.len()
            )));
        }
        for &v in quantity {
            write_f32(w, v)?;
        }
    }
    w.write_all(&names)?;
    Ok(())
}

/// Decode a binary state. Any version other than [`CURRENT_VERSION`] is
/// rejected with [`FieldlinesError::UnsupportedVersion`].
pub fn read_osfls(r: &mut impl Read) -> Result<FieldlinesState, FieldlinesError> {
    let version = read_i32(r)?;
    if version != CURRENT_VERSION {
        return Err(FieldlinesError::UnsupportedVersion { found: version });
    }

    let trigger_time = read_f64(r)?;
    let model_tag = read_i32(r)?;
    let model = Model::from_i32(model_tag)
        .ok_or_else(|| FieldlinesError::MalformedFile(format!("unknown model tag {model_tag}")))?;
    let [morphable] = read_array::<1>(r)?;

    let n_lines = read_len(r, "line count")?;
    let n_points = read_len(r, "vertex count")?;
    let n_extras = read_len(r, "quantity count")?;
    let name_bytes = read_len(r, "name byte length")?;

    let mut line_start = Vec::with_capacity(n_lines.min(1 << 20));
    for _ in 0..n_lines {
        let start = read_i32(r)?;
        let start = u32::try_from(start)
            .map_err(|_| FieldlinesError::MalformedFile(format!("negative line start {start}")))?;
        line_start.push(start);
    }
    let mut line_count = Vec::with_capacity(n_lines.min(1 << 20));
    for _ in 0..n_lines {
        line_count.push(read_u32(r)?);
    }

    let mut vertex_positions = Vec::with_capacity(n_points.min(1 << 24));
    for _ in 0..n_points {
        let x = read_f32(r)?;
        let y = read_f32(r)?;
        let z = read_f32(r)?;
        vertex_positions.push(Vec3::new(x, y, z));
    }

    let mut extra_quantities = Vec::with_capacity(n_extras.min(1 << 10));
    for _ in 0..n_extras {
        let mut quantity = Vec::with_capacity(n_points.min(1 << 24));
        for _ in 0..n_points {
            quantity.push(read_f32(r)?);
        }
        extra_quantities.push(quantity);
    }

    let mut names = Vec::new();
    let read = r.take(name_bytes as u64).read_to_end(&mut names)?;
    if read != name_bytes {
        return Err(FieldlinesError::MalformedFile(format!(
            "expected {name_bytes} bytes of quantity names, found {read}"
        )));
    }
    let terminated = names.strip_suffix(&[0]).unwrap_or(&names);
    let extra_quantity_names = terminated
        .split(|&b| b == 0)
        .filter(|_| !names.is_empty())
        .map(|bytes| {
            String::from_utf8(bytes.to_vec()).map_err(|e| {
                FieldlinesError::MalformedFile(format!("quantity name is not UTF-8: {e}"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    if extra_quantity_names.len() != n_extras {
        return Err(FieldlinesError::MalformedFile(format!(
            "expected {n_extras} quantity names, found {}",
            extra_quantity_names.len()
        )));
    }

    let mut state = FieldlinesState {
        trigger_time,
        model,
        is_morphable: morphable != 0,
        line_start,
        line_count,
        vertex_positions,
        extra_quantities,
        ..FieldlinesState::default()
    };
    state.set_extra_quantity_names(extra_quantity_names);
    state
        .validate()
        .map_err(|e| FieldlinesError::MalformedFile(e.to_string()))?;
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> FieldlinesState {
        let mut state = FieldlinesState::new();
        state.set_trigger_time(5.5e8 + 0.125);
        state.set_model(Model::Batsrus);
        state.set_extra_quantity_names(vec!["T".to_owned(), "rho".to_owned(), "j_para".to_owned()]);
        let mut a = vec![Vec3::new(1.5, -2.25, 3.0), Vec3::new(1e-7, 6.4e6, -0.0)];
        let mut b = vec![Vec3::new(0.1, 0.2, 0.3); 3];
        state.add_line(&mut a);
        state.add_line(&mut b);
        for i in 0..5 {
            for q in 0..3 {
                state.append_to_extra(q, (i * 3 + q) as f32 * 0.37).unwrap();
            }
        }
        state
    }

    fn encode(state: &FieldlinesState) -> Vec<u8> {
        let mut buf = Vec::new();
        write_osfls(state, &mut buf).unwrap();
        buf
    }

    // ── Round trip ──────────────────────────────────────────────

    #[test]
    fn round_trip_preserves_everything() {
        let state = sample_state();
        let decoded = read_osfls(&mut encode(&state).as_slice()).unwrap();
        assert_eq!(decoded, state);
        assert_eq!(decoded.extra_quantity_names(), &["T", "rho", "j_para"]);
        assert_eq!(decoded.extra_quantity_index("j_para"), Some(2));
    }

    #[test]
    fn header_layout_is_fixed() {
        let buf = encode(&sample_state());
        assert_eq!(&buf[0..4], &0i32.to_le_bytes());
        assert_eq!(&buf[4..12], &(5.5e8f64 + 0.125).to_le_bytes());
        assert_eq!(&buf[12..16], &0i32.to_le_bytes());
        assert_eq!(buf[16], 0);
        assert_eq!(&buf[17..25], &2u64.to_le_bytes());
        assert_eq!(&buf[25..33], &5u64.to_le_bytes());
        assert_eq!(&buf[33..41], &3u64.to_le_bytes());
        assert_eq!(&buf[41..49], &("T\0rho\0j_para\0".len() as u64).to_le_bytes());
        let expected_len = 49 + 2 * 4 + 2 * 4 + 5 * 12 + 3 * 5 * 4 + 13;
        assert_eq!(buf.len(), expected_len);
        assert!(buf.ends_with(b"j_para\0"));
    }

    // ── Rejections ──────────────────────────────────────────────

    #[test]
    fn unknown_version_is_fatal() {
        let mut buf = encode(&sample_state());
        buf[0..4].copy_from_slice(&1i32.to_le_bytes());
        assert!(matches!(
            read_osfls(&mut buf.as_slice()),
            Err(FieldlinesError::UnsupportedVersion { found: 1 })
        ));
    }

    #[test]
    fn truncated_file_is_malformed() {
        let buf = encode(&sample_state());
        let truncated = &buf[..buf.len() - 20];
        assert!(matches!(
            read_osfls(&mut &truncated[..]),
            Err(FieldlinesError::MalformedFile(_))
        ));
    }

    #[test]
    fn inconsistent_counts_are_malformed() {
        let mut buf = encode(&sample_state());
        // Second line count: 3 -> 4, so lines cover 6 of 5 vertices.
        let offset = 49 + 2 * 4 + 4;
        buf[offset..offset + 4].copy_from_slice(&4u32.to_le_bytes());
        assert!(matches!(
            read_osfls(&mut buf.as_slice()),
            Err(FieldlinesError::MalformedFile(_))
        ));
    }

    #[test]
    fn empty_state_round_trips() {
        let state = FieldlinesState::new();
        let decoded = read_osfls(&mut encode(&state).as_slice()).unwrap();
        assert_eq!(decoded.n_lines(), 0);
        assert_eq!(decoded.model(), Model::Invalid);
    }
}
