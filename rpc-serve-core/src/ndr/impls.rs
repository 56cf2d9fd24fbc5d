use super::{Error, Marshal, Reader, Unmarshal, Writer};

macro_rules! primitive {
    ($($ty:ty => $write:ident, $read:ident;)*) => {
        $(
            impl Marshal for $ty {
                fn marshal(&self, w: &mut Writer) -> Result<(), Error> {
                    w.$write(*self);
                    Ok(())
                }
            }

            impl Unmarshal for $ty {
                fn unmarshal(r: &mut Reader<'_>) -> Result<Self, Error> {
                    r.$read()
                }
            }
        )*
    };
}

primitive! {
    u8 => write_u8, read_u8;
    u16 => write_u16, read_u16;
    u32 => write_u32, read_u32;
    u64 => write_u64, read_u64;
}

impl Marshal for i32 {
    fn marshal(&self, w: &mut Writer) -> Result<(), Error> {
        w.write_u32(*self as u32);
        Ok(())
    }
}

impl Unmarshal for i32 {
    fn unmarshal(r: &mut Reader<'_>) -> Result<Self, Error> {
        r.read_u32().map(|v| v as i32)
    }
}

impl Marshal for i64 {
    fn marshal(&self, w: &mut Writer) -> Result<(), Error> {
        w.write_u64(*self as u64);
        Ok(())
    }
}

impl Unmarshal for i64 {
    fn unmarshal(r: &mut Reader<'_>) -> Result<Self, Error> {
        r.read_u64().map(|v| v as i64)
    }
}

// NDR booleans are a single byte, any non-zero value reading as true.
impl Marshal for bool {
    fn marshal(&self, w: &mut Writer) -> Result<(), Error> {
        w.write_u8(u8::from(*self));
        Ok(())
    }
}

impl Unmarshal for bool {
    fn unmarshal(r: &mut Reader<'_>) -> Result<Self, Error> {
        r.read_u8().map(|v| v != 0)
    }
}

impl Marshal for str {
    fn marshal(&self, w: &mut Writer) -> Result<(), Error> {
        let units: Vec<u16> = self.encode_utf16().chain(std::iter::once(0)).collect();
        w.write_count(units.len())?;
        w.write_u32(0);
        w.write_count(units.len())?;
        for unit in units {
            w.write_u16(unit);
        }
        Ok(())
    }
}

impl Marshal for String {
    fn marshal(&self, w: &mut Writer) -> Result<(), Error> {
        self.as_str().marshal(w)
    }
}

impl Unmarshal for String {
    fn unmarshal(r: &mut Reader<'_>) -> Result<Self, Error> {
        let max = r.read_u32()?;
        let offset = r.read_u32()?;
        if offset != 0 {
            return Err(Error::UnsupportedOffset(offset));
        }
        let actual = r.read_count(2)?;
        if actual > max {
            return Err(Error::InconsistentCount { max, actual });
        }
        let mut units = Vec::with_capacity(actual as usize);
        for _ in 0..actual {
            units.push(r.read_u16()?);
        }
        match units.pop() {
            Some(0) => {}
            _ => return Err(Error::MissingTerminator),
        }
        String::from_utf16(&units).map_err(|_| Error::InvalidUtf16)
    }
}

impl<T: Marshal> Marshal for [T] {
    fn marshal(&self, w: &mut Writer) -> Result<(), Error> {
        w.write_count(self.len())?;
        for item in self {
            item.marshal(w)?;
        }
        Ok(())
    }
}

impl<T: Marshal> Marshal for Vec<T> {
    fn marshal(&self, w: &mut Writer) -> Result<(), Error> {
        self.as_slice().marshal(w)
    }
}

impl<T: Unmarshal> Unmarshal for Vec<T> {
    fn unmarshal(r: &mut Reader<'_>) -> Result<Self, Error> {
        let count = r.read_count(1)?;
        let mut out = Vec::with_capacity(count as usize);
        for _ in 0..count {
            out.push(T::unmarshal(r)?);
        }
        Ok(out)
    }
}

impl<T: Marshal> Marshal for Option<T> {
    fn marshal(&self, w: &mut Writer) -> Result<(), Error> {
        match self {
            None => {
                w.write_u32(0);
                Ok(())
            }
            Some(value) => {
                w.write_referent();
                value.marshal(w)
            }
        }
    }
}

impl<T: Unmarshal> Unmarshal for Option<T> {
    fn unmarshal(r: &mut Reader<'_>) -> Result<Self, Error> {
        match r.read_u32()? {
            0 => Ok(None),
            _referent => T::unmarshal(r).map(Some),
        }
    }
}

impl<T: Marshal + ?Sized> Marshal for &T {
    fn marshal(&self, w: &mut Writer) -> Result<(), Error> {
        (**self).marshal(w)
    }
}

impl<T: Marshal + ?Sized> Marshal for Box<T> {
    fn marshal(&self, w: &mut Writer) -> Result<(), Error> {
        (**self).marshal(w)
    }
}

impl<T: Unmarshal> Unmarshal for Box<T> {
    fn unmarshal(r: &mut Reader<'_>) -> Result<Self, Error> {
        T::unmarshal(r).map(Box::new)
    }
}
