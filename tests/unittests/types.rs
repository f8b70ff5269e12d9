use dynffi::{Kind, Type};

#[test]
fn catalog_names_match_c_spelling() {
    let names: Vec<&str> = Type::ALL.iter().map(|t| t.name()).collect();
    assert_eq!(
        names,
        vec![
            "void",
            "char",
            "unsigned char",
            "int",
            "unsigned int",
            "long",
            "unsigned long",
            "uint8_t",
            "uint16_t",
            "uint32_t",
            "uint64_t",
            "int8_t",
            "int16_t",
            "int32_t",
            "int64_t",
            "float",
            "double",
            "void *",
        ]
    );
}

#[test]
fn by_name_finds_every_entry() {
    for t in Type::ALL {
        assert_eq!(Type::by_name(t.name()), Some(t));
    }
    assert_eq!(Type::by_name("long double"), None);
}

#[test]
fn lookup_agrees_with_kind_descriptor() {
    for kind in Kind::ALL {
        assert_eq!(Type::lookup(kind), kind.descriptor());
        assert!(!Type::lookup(kind).is_void());
    }
}

#[cfg(all(unix, target_pointer_width = "64"))]
#[test]
fn sizes_match_rust_layouts() {
    use std::ffi::{c_char, c_int, c_long, c_void};
    use std::mem::size_of;

    assert_eq!(Type::VOID.size(), 0);
    assert_eq!(Type::CHAR.size(), size_of::<c_char>());
    assert_eq!(Type::INT.size(), size_of::<c_int>());
    assert_eq!(Type::LONG.size(), size_of::<c_long>());
    assert_eq!(Type::POINTER.size(), size_of::<*mut c_void>());
    assert_eq!(Type::DOUBLE.alignment(), std::mem::align_of::<f64>());
}

#[test]
fn display_is_c_name() {
    assert_eq!(Type::POINTER.to_string(), "void *");
    assert_eq!(format!("{}", Type::UINT16), "uint16_t");
}
