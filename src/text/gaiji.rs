//! Gaiji (supplementary symbol) substitution table, ARIB STD-B24 table 7-11.
//!
//! Two-byte codes with a first byte of 0x75 or above are looked up here and
//! replaced by a short string; codes absent from the table emit nothing.

pub struct Gaiji {
    pub code: u16,
    pub replacement: &'static str,
}

const fn g(code: u16, replacement: &'static str) -> Gaiji {
    Gaiji { code, replacement }
}

pub static GAIJI_TABLE: &[Gaiji] = &[
    // row 90, 45..63
    g(0x7A4D, "10."),
    g(0x7A4E, "11."),
    g(0x7A4F, "12."),
    g(0x7A50, "[HV]"),
    g(0x7A51, "[SD]"),
    g(0x7A52, "[P]"),
    g(0x7A53, "[W]"),
    g(0x7A54, "[MV]"),
    g(0x7A55, "[手]"),
    g(0x7A56, "[字]"),
    g(0x7A57, "[双]"),
    g(0x7A58, "[デ]"),
    g(0x7A59, "[S]"),
    g(0x7A5A, "[二]"),
    g(0x7A5B, "[多]"),
    g(0x7A5C, "[解]"),
    g(0x7A5D, "[SS]"),
    g(0x7A5E, "[B]"),
    g(0x7A5F, "[N]"),
    // row 90, 64..66
    g(0x7A60, "■"),
    g(0x7A61, "●"),
    // row 90, 66..85
    g(0x7A62, "[天]"),
    g(0x7A63, "[交]"),
    g(0x7A64, "[映]"),
    g(0x7A65, "[無]"),
    g(0x7A66, "[料]"),
    g(0x7A67, "[年齢制限]"),
    g(0x7A68, "[前]"),
    g(0x7A69, "[後]"),
    g(0x7A6A, "[再]"),
    g(0x7A6B, "[新]"),
    g(0x7A6C, "[初]"),
    g(0x7A6D, "[終]"),
    g(0x7A6E, "[生]"),
    g(0x7A6F, "[販]"),
    g(0x7A70, "[声]"),
    g(0x7A71, "[吹]"),
    g(0x7A72, "[PPV]"),
    g(0x7A73, "(秘)"),
    g(0x7A74, "ほか"),
    g(0x7A75, "[MV]"),
    // row 92
    g(0x7C21, "→"),
    g(0x7C22, "←"),
    g(0x7C23, "↑"),
    g(0x7C24, "↓"),
    g(0x7C25, "●"),
    g(0x7C26, "○"),
    g(0x7C27, "年"),
    g(0x7C28, "月"),
    g(0x7C29, "日"),
    g(0x7C2A, "円"),
    g(0x7C2B, "㎡"),
    g(0x7C2C, "m^3"),
    g(0x7C2D, "㎝"),
    g(0x7C2E, "㎝^2"),
    g(0x7C2F, "㎝^3"),
    g(0x7C30, "０."),
    g(0x7C31, "１."),
    g(0x7C32, "２."),
    g(0x7C33, "３."),
    g(0x7C34, "４."),
    g(0x7C35, "５."),
    g(0x7C36, "６."),
    g(0x7C37, "７."),
    g(0x7C38, "８."),
    g(0x7C39, "９."),
    g(0x7C3A, "氏"),
    g(0x7C3B, "副"),
    g(0x7C3C, "元"),
    g(0x7C3D, "故"),
    g(0x7C3E, "前"),
    g(0x7C3F, "後"),
    g(0x7C40, "０,"),
    g(0x7C41, "１,"),
    g(0x7C42, "２,"),
    g(0x7C43, "３,"),
    g(0x7C44, "４,"),
    g(0x7C45, "５,"),
    g(0x7C46, "６,"),
    g(0x7C47, "７,"),
    g(0x7C48, "８,"),
    g(0x7C49, "９,"),
    g(0x7C4A, "(社)"),
    g(0x7C4B, "(財)"),
    g(0x7C4C, "(有)"),
    g(0x7C4D, "(株)"),
    g(0x7C4E, "(代)"),
    g(0x7C4F, "(問)"),
    g(0x7C55, "^2"),
    g(0x7C56, "^3"),
    g(0x7C57, "(CD)"),
    g(0x7C58, "(vn)"),
    g(0x7C59, "(ob)"),
    g(0x7C5A, "(cb)"),
    g(0x7C5B, "(ce"),
    g(0x7C5C, "mb)"),
    g(0x7C5D, "(hp)"),
    g(0x7C5E, "(br)"),
    g(0x7C5F, "(p)"),
    g(0x7C60, "(s)"),
    g(0x7C61, "(ms)"),
    g(0x7C62, "(t)"),
    g(0x7C63, "(bs)"),
    g(0x7C64, "(b)"),
    g(0x7C65, "(tb)"),
    g(0x7C66, "(tp)"),
    g(0x7C67, "(ds)"),
    g(0x7C68, "(ag)"),
    g(0x7C69, "(eg)"),
    g(0x7C6A, "(vo)"),
    g(0x7C6B, "(fl)"),
    g(0x7C6C, "(ke"),
    g(0x7C6D, "y)"),
    g(0x7C6E, "(sa"),
    g(0x7C6F, "x)"),
    g(0x7C70, "(sy"),
    g(0x7C71, "n)"),
    g(0x7C72, "(or"),
    g(0x7C73, "g)"),
    g(0x7C74, "(pe"),
    g(0x7C75, "r)"),
    g(0x7C76, "(R)"),
    g(0x7C77, "(C)"),
    g(0x7C78, "(箏)"),
    g(0x7C79, "DJ"),
    g(0x7C7A, "[演]"),
    g(0x7C7B, "Fax"),
    // row 93
    g(0x7D21, "(月)"),
    g(0x7D22, "(火)"),
    g(0x7D23, "(水)"),
    g(0x7D24, "(木)"),
    g(0x7D25, "(金)"),
    g(0x7D26, "(土)"),
    g(0x7D27, "(日)"),
    g(0x7D28, "(祝)"),
    g(0x7D29, "明治"),
    g(0x7D2A, "大正"),
    g(0x7D2B, "昭和"),
    g(0x7D2C, "平成"),
    g(0x7D2D, "No."),
    g(0x7D2E, "Tel"),
    g(0x7D2F, "(〒)"),
    g(0x7D30, "()()"),
    g(0x7D31, "[本]"),
    g(0x7D32, "[三]"),
    g(0x7D33, "[二]"),
    g(0x7D34, "[安]"),
    g(0x7D35, "[点]"),
    g(0x7D36, "[打]"),
    g(0x7D37, "[盗]"),
    g(0x7D38, "[勝]"),
    g(0x7D39, "[敗]"),
    g(0x7D3A, "[S]"),
    g(0x7D3B, "[投]"),
    g(0x7D3C, "[捕]"),
    g(0x7D3D, "[一]"),
    g(0x7D3E, "[二]"),
    g(0x7D3F, "[三]"),
    g(0x7D40, "[遊]"),
    g(0x7D41, "[左]"),
    g(0x7D42, "[中]"),
    g(0x7D43, "[右]"),
    g(0x7D44, "[指]"),
    g(0x7D45, "[走]"),
    g(0x7D46, "[打]"),
    g(0x7D47, "㍑"),
    g(0x7D48, "kg"),
    g(0x7D49, "Hz"),
    g(0x7D4A, "ha"),
    g(0x7D4B, "km"),
    g(0x7D4C, "km^2"),
    g(0x7D4D, "hPa"),
    g(0x7D50, "1/2"),
    g(0x7D51, "0/3"),
    g(0x7D52, "1/3"),
    g(0x7D53, "2/3"),
    g(0x7D54, "1/4"),
    g(0x7D55, "3/4"),
    g(0x7D56, "1/5"),
    g(0x7D57, "2/5"),
    g(0x7D58, "3/5"),
    g(0x7D59, "4/5"),
    g(0x7D5A, "1/6"),
    g(0x7D5B, "5/6"),
    g(0x7D5C, "1/7"),
    g(0x7D5D, "1/8"),
    g(0x7D5E, "1/9"),
    g(0x7D5F, "1/10"),
    g(0x7D6E, "!!"),
    g(0x7D6F, "!?"),
    // row 94
    g(0x7E21, "Ⅰ"),
    g(0x7E22, "Ⅱ"),
    g(0x7E23, "Ⅲ"),
    g(0x7E24, "Ⅳ"),
    g(0x7E25, "Ⅴ"),
    g(0x7E26, "Ⅵ"),
    g(0x7E27, "Ⅶ"),
    g(0x7E28, "Ⅷ"),
    g(0x7E29, "Ⅸ"),
    g(0x7E2A, "Ⅹ"),
    g(0x7E2B, "XI"),
    g(0x7E2C, "XII"),
    g(0x7E2D, "⑰"),
    g(0x7E2E, "⑱"),
    g(0x7E2F, "⑲"),
    g(0x7E30, "⑳"),
    g(0x7E31, "(1)"),
    g(0x7E32, "(2)"),
    g(0x7E33, "(3)"),
    g(0x7E34, "(4)"),
    g(0x7E35, "(5)"),
    g(0x7E36, "(6)"),
    g(0x7E37, "(7)"),
    g(0x7E38, "(8)"),
    g(0x7E39, "(9)"),
    g(0x7E3A, "(10)"),
    g(0x7E3B, "(11)"),
    g(0x7E3C, "(12)"),
    g(0x7E3D, "(21)"),
    g(0x7E3E, "(22)"),
    g(0x7E3F, "(23)"),
    g(0x7E40, "(24)"),
    g(0x7E41, "(A)"),
    g(0x7E42, "(B)"),
    g(0x7E43, "(C)"),
    g(0x7E44, "(D)"),
    g(0x7E45, "(E)"),
    g(0x7E46, "(F)"),
    g(0x7E47, "(G)"),
    g(0x7E48, "(H)"),
    g(0x7E49, "(I)"),
    g(0x7E4A, "(J)"),
    g(0x7E4B, "(K)"),
    g(0x7E4C, "(L)"),
    g(0x7E4D, "(M)"),
    g(0x7E4E, "(N)"),
    g(0x7E4F, "(O)"),
    g(0x7E50, "(P)"),
    g(0x7E51, "(Q)"),
    g(0x7E52, "(R)"),
    g(0x7E53, "(S)"),
    g(0x7E54, "(T)"),
    g(0x7E55, "(U)"),
    g(0x7E56, "(V)"),
    g(0x7E57, "(W)"),
    g(0x7E58, "(X)"),
    g(0x7E59, "(Y)"),
    g(0x7E5A, "(Z)"),
    g(0x7E5B, "(25)"),
    g(0x7E5C, "(26)"),
    g(0x7E5D, "(27)"),
    g(0x7E5E, "(28)"),
    g(0x7E5F, "(29)"),
    g(0x7E60, "(30)"),
    g(0x7E61, "①"),
    g(0x7E62, "②"),
    g(0x7E63, "③"),
    g(0x7E64, "④"),
    g(0x7E65, "⑤"),
    g(0x7E66, "⑥"),
    g(0x7E67, "⑦"),
    g(0x7E68, "⑧"),
    g(0x7E69, "⑨"),
    g(0x7E6A, "⑩"),
    g(0x7E6B, "⑪"),
    g(0x7E6C, "⑫"),
    g(0x7E6D, "⑬"),
    g(0x7E6E, "⑭"),
    g(0x7E6F, "⑮"),
    g(0x7E70, "⑯"),
    g(0x7E71, "(1)"),
    g(0x7E72, "(2)"),
    g(0x7E73, "(3)"),
    g(0x7E74, "(4)"),
    g(0x7E75, "(5)"),
    g(0x7E76, "(6)"),
    g(0x7E77, "(7)"),
    g(0x7E78, "(8)"),
    g(0x7E79, "(9)"),
    g(0x7E7A, "(10)"),
    g(0x7E7B, "(11)"),
    g(0x7E7C, "(12)"),
    g(0x7E7D, "(31)"),
];

/// Linear lookup, mirroring how small and rarely these occur per text field.
pub fn lookup(code: u16) -> Option<&'static str> {
    GAIJI_TABLE
        .iter()
        .find(|e| e.code == code)
        .map(|e| e.replacement)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_symbols() {
        assert_eq!(lookup(0x7A50), Some("[HV]"));
        assert_eq!(lookup(0x7E61), Some("①"));
        assert_eq!(lookup(0x7D2C), Some("平成"));
    }

    #[test]
    fn absent_codes_yield_none() {
        assert_eq!(lookup(0x7525), None);
        assert_eq!(lookup(0x7A00), None);
    }
}
