#[cfg(test)]
mod tests {
    use crate::{op::Protocol, token::Token};

    #[test]
    fn test_every_protocol_name_round_trips() {
        for proto in Protocol::ALL {
            assert_eq!(Protocol::from_name(proto.name()), Some(proto));
        }
        assert_eq!(Protocol::from_name("__nope__"), None);
    }

    #[test]
    fn test_compound_tokens_map_to_assign_twins() {
        let pairs = [
            (Token::AddAssign, Token::Add),
            (Token::SubAssign, Token::Sub),
            (Token::MulAssign, Token::Mul),
            (Token::QuoAssign, Token::Quo),
            (Token::RemAssign, Token::Rem),
            (Token::AndAssign, Token::And),
            (Token::OrAssign, Token::Or),
            (Token::XorAssign, Token::Xor),
            (Token::ShlAssign, Token::Shl),
            (Token::ShrAssign, Token::Shr),
            (Token::AndNotAssign, Token::AndNot),
        ];
        for (compound, plain) in pairs {
            let assign = Protocol::compound(compound).expect("compound protocol");
            let base = Protocol::binary(plain).expect("binary protocol");
            assert_eq!(base.assign_form(), Some(assign));
        }
    }

    #[test]
    fn test_operator_tables_reject_foreign_tokens() {
        assert_eq!(Protocol::binary(Token::Assign), None);
        assert_eq!(Protocol::unary(Token::Add), None);
        assert_eq!(Protocol::unary(Token::Sub), Some(Protocol::Minus));
        assert_eq!(Protocol::compound(Token::Add), None);
        assert_eq!(Protocol::inc_dec(Token::Inc), Some(Protocol::Inc));
        assert_eq!(Protocol::Lss.name(), "__lss__");
        assert_eq!(Protocol::AndNotAssign.name(), "__and_not_assign__");
    }
}
