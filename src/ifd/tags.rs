/// Well known tag ids of the 0th IFD and their names.
#[repr(u16)]
#[derive(strum::FromRepr, strum::IntoStaticStr, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tag {
    NewSubFileType = 254,
    ImageWidth = 256,
    ImageLength = 257,
    BitsPerSample = 258,
    Compression = 259,
    PhotometricInterpretation = 262,
    ImageDescription = 270,
    Make = 271,
    Model = 272,
    /// For each strip, the byte offset of that strip.
    StripOffsets = 273,
    Orientation = 274,
    SamplesPerPixel = 277,
    /// The number of rows in each strip (except possibly the last strip.)
    RowsPerStrip = 278,
    /// For each strip, the number of bytes in that strip after any compression.
    StripByteCounts = 279,
    /// The number of pixels per ResolutionUnit in the ImageWidth (typically, horizontal) direction.
    XResolution = 282,
    /// The number of pixels per ResolutionUnit in the ImageLength (typically, vertical) direction.
    YResolution = 283,
    PlanarConfiguration = 284,
    ResolutionUnit = 296,
    Software = 305,
    DateTime = 306,
    Artist = 315,
    ColorMap = 320,
    TileWidth = 322,
    TileLength = 323,
    TileOffsets = 324,
    TileByteCounts = 325,
    JPEGInterchangeFormat = 513,
    JPEGInterchangeFormatLength = 514,
    YCbCrPositioning = 531,
    Copyright = 33432,
    ExifIFDPointer = 34665,
    GPSIFDPointer = 34853,
    InteroperabilityIFDPointer = 40965,
}

impl Tag {
    /// Tags whose value is the file offset of a nested IFD.
    pub const SUB_IFD_POINTERS: [Tag; 3] = [
        Tag::ExifIFDPointer,
        Tag::GPSIFDPointer,
        Tag::InteroperabilityIFDPointer,
    ];

    pub fn name(self) -> &'static str {
        self.into()
    }
}
