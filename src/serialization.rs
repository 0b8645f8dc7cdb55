use speedy::{Context, Readable, Reader, Writable, Writer};

use crate::{constant::NS_PER_SEC, structure::time_value::TimeValue};

// TimeValue serialization:
//
// One kind byte, then for finite values the seconds as i64 and the
// nanoseconds as u32, both in the context endianness. The infinities carry no
// payload, so a finite value can never be mistaken for one.
// E.g. 1.5s is encoded in little-endian as:
// 01 01 00 00 00 00 00 00 00 00 65 CD 1D
const KIND_INFINITE_PAST: u8 = 0;
const KIND_FINITE: u8 = 1;
const KIND_INFINITE_FUTURE: u8 = 2;

impl<'a, C: Context> Readable<'a, C> for TimeValue {
  #[inline]
  fn read_from<R: Reader<'a, C>>(reader: &mut R) -> Result<Self, C::Error> {
    match reader.read_u8()? {
      KIND_INFINITE_PAST => Ok(TimeValue::INFINITE_PAST),
      KIND_INFINITE_FUTURE => Ok(TimeValue::INFINITE_FUTURE),
      KIND_FINITE => {
        let seconds: i64 = reader.read_value()?;
        let nanos: u32 = reader.read_value()?;
        if i64::from(nanos) >= NS_PER_SEC {
          return Err(
            speedy::Error::custom(format!("Unnormalized nanoseconds {} in TimeValue.", nanos))
              .into(),
          );
        }
        Ok(TimeValue::finite(seconds, nanos))
      }
      other => Err(speedy::Error::custom(format!("Unknown TimeValue kind {}.", other)).into()),
    }
  }

  #[inline]
  fn minimum_bytes_needed() -> usize {
    1
  }
}

impl<C: Context> Writable<C> for TimeValue {
  #[inline]
  fn write_to<T: ?Sized + Writer<C>>(&self, writer: &mut T) -> Result<(), C::Error> {
    match self.as_parts() {
      Some((seconds, nanos)) => {
        writer.write_u8(KIND_FINITE)?;
        writer.write_i64(seconds)?;
        writer.write_u32(nanos)?;
      }
      None if self.is_infinite_future() => writer.write_u8(KIND_INFINITE_FUTURE)?,
      None => writer.write_u8(KIND_INFINITE_PAST)?,
    }
    Ok(())
  }
}
