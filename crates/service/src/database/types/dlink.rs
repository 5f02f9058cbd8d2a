use std::str::FromStr;

use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::sqlite::{SqliteArgumentValue, SqliteTypeInfo, SqliteValueRef};
use sqlx::{Decode, Encode, Sqlite, Type};

use common::prelude::{CidError, Link};

/// A [`Link`] stored as its base32 CID string
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct DLink(Link);

impl From<DLink> for Link {
    fn from(val: DLink) -> Self {
        val.0
    }
}

impl From<Link> for DLink {
    fn from(link: Link) -> Self {
        Self(link)
    }
}

impl Decode<'_, Sqlite> for DLink {
    fn decode(value: SqliteValueRef<'_>) -> Result<Self, BoxDynError> {
        let db_val = <String as Decode<Sqlite>>::decode(value)?;
        let link = Link::from_str(&db_val).map_err(DLinkError::InvalidLink)?;

        Ok(Self(link))
    }
}

impl Encode<'_, Sqlite> for DLink {
    fn encode_by_ref(
        &self,
        args: &mut Vec<SqliteArgumentValue<'_>>,
    ) -> Result<IsNull, BoxDynError> {
        args.push(SqliteArgumentValue::Text(self.0.to_string().into()));
        Ok(IsNull::No)
    }
}

impl Type<Sqlite> for DLink {
    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <String as Type<Sqlite>>::compatible(ty)
    }

    fn type_info() -> SqliteTypeInfo {
        <String as Type<Sqlite>>::type_info()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DLinkError {
    #[error("invalid link: {0}")]
    InvalidLink(#[from] CidError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::linked_data::LD_CBOR_CODEC;

    #[test]
    fn test_encode_link() -> Result<(), BoxDynError> {
        let link = Link::for_content(LD_CBOR_CODEC, b"root manifest");
        let dlink = DLink::from(link);

        let mut args = Vec::new();
        let _ = dlink.encode_by_ref(&mut args)?;

        if let SqliteArgumentValue::Text(encoded) = &args[0] {
            assert_eq!(encoded.as_ref(), link.to_string());
            assert!(encoded.starts_with('b'));
        } else {
            panic!("Expected Text variant");
        }

        Ok(())
    }
}
