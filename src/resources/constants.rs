//! Engine constants that attributes may reference by name.
//!
//! Hosts write these as plain strings (`"RepeatWrapping"`, `"NearestFilter"`);
//! the schema maps them to [`Constant`] values and checks they belong to the
//! [`ConstantKind`] the attribute expects.

use std::fmt;

/// The family a constant belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstantKind {
    Shading,
    VertexColors,
    Mapping,
    Wrapping,
    Filter,
    PixelFormat,
    TexelType,
}

macro_rules! engine_constants {
    (
        $( $kind:ident => { $( $variant:ident = ($name:literal, $value:literal) ),* $(,)? } )*
    ) => {
        /// A named engine constant and its numeric value.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Constant {
            $( $( $variant, )* )*
        }

        impl Constant {
            /// Every known constant.
            pub const ALL: &'static [Constant] = &[ $( $( Constant::$variant, )* )* ];

            /// The name hosts use to refer to this constant.
            #[must_use]
            pub fn name(self) -> &'static str {
                match self {
                    $( $( Constant::$variant => $name, )* )*
                }
            }

            /// The numeric value the renderer understands.
            #[must_use]
            pub fn value(self) -> u32 {
                match self {
                    $( $( Constant::$variant => $value, )* )*
                }
            }

            #[must_use]
            pub fn kind(self) -> ConstantKind {
                match self {
                    $( $( Constant::$variant => ConstantKind::$kind, )* )*
                }
            }
        }
    };
}

engine_constants! {
    Shading => {
        FlatShading = ("FlatShading", 1),
        SmoothShading = ("SmoothShading", 2),
    }
    VertexColors => {
        NoColors = ("NoColors", 0),
        FaceColors = ("FaceColors", 1),
        VertexColors = ("VertexColors", 2),
    }
    Mapping => {
        UvMapping = ("UVMapping", 300),
        CubeReflectionMapping = ("CubeReflectionMapping", 301),
        CubeRefractionMapping = ("CubeRefractionMapping", 302),
        EquirectangularReflectionMapping = ("EquirectangularReflectionMapping", 303),
        EquirectangularRefractionMapping = ("EquirectangularRefractionMapping", 304),
        SphericalReflectionMapping = ("SphericalReflectionMapping", 305),
    }
    Wrapping => {
        RepeatWrapping = ("RepeatWrapping", 1000),
        ClampToEdgeWrapping = ("ClampToEdgeWrapping", 1001),
        MirroredRepeatWrapping = ("MirroredRepeatWrapping", 1002),
    }
    Filter => {
        NearestFilter = ("NearestFilter", 1003),
        NearestMipMapNearestFilter = ("NearestMipMapNearestFilter", 1004),
        NearestMipMapLinearFilter = ("NearestMipMapLinearFilter", 1005),
        LinearFilter = ("LinearFilter", 1006),
        LinearMipMapNearestFilter = ("LinearMipMapNearestFilter", 1007),
        LinearMipMapLinearFilter = ("LinearMipMapLinearFilter", 1008),
    }
    TexelType => {
        UnsignedByteType = ("UnsignedByteType", 1009),
        ByteType = ("ByteType", 1010),
        ShortType = ("ShortType", 1011),
        UnsignedShortType = ("UnsignedShortType", 1012),
        IntType = ("IntType", 1013),
        UnsignedIntType = ("UnsignedIntType", 1014),
        FloatType = ("FloatType", 1015),
        HalfFloatType = ("HalfFloatType", 1016),
        UnsignedShort4444Type = ("UnsignedShort4444Type", 1017),
        UnsignedShort5551Type = ("UnsignedShort5551Type", 1018),
        UnsignedShort565Type = ("UnsignedShort565Type", 1019),
    }
    PixelFormat => {
        AlphaFormat = ("AlphaFormat", 1021),
        RgbFormat = ("RGBFormat", 1022),
        RgbaFormat = ("RGBAFormat", 1023),
        LuminanceFormat = ("LuminanceFormat", 1024),
        LuminanceAlphaFormat = ("LuminanceAlphaFormat", 1025),
        RgbS3tcDxt1Format = ("RGB_S3TC_DXT1_Format", 33776),
        RgbaS3tcDxt1Format = ("RGBA_S3TC_DXT1_Format", 33777),
        RgbaS3tcDxt3Format = ("RGBA_S3TC_DXT3_Format", 33778),
        RgbaS3tcDxt5Format = ("RGBA_S3TC_DXT5_Format", 33779),
    }
}

impl Constant {
    /// Looks a constant up by its host-facing name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.name() == name)
    }

    /// Looks a constant up by name, accepting it only if it has the given kind.
    #[must_use]
    pub fn from_name_of_kind(name: &str, kind: ConstantKind) -> Option<Self> {
        Self::from_name(name).filter(|c| c.kind() == kind)
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
